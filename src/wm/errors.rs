//! Error Policy Module
//!
//! Every protocol error is discarded except the one that tells us another
//! window manager already holds substructure redirect on the root window.

use thiserror::Error;
use tracing::trace;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto::CHANGE_WINDOW_ATTRIBUTES_REQUEST;

/// Conditions that end the process before the event loop starts
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot open display connection")]
    ConnectionFailed(#[source] ConnectError),

    #[error("another window manager is already running")]
    AnotherWmRunning,

    #[error("connection to X server lost during startup")]
    ConnectionLost(#[source] ConnectionError),
}

/// Lifecycle phase the policy is applied in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Running,
}

/// What to do with a protocol error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Discard,
    Fatal,
}

/// Process-wide protocol error policy
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    phase: Phase,
}

impl ErrorPolicy {
    pub fn startup() -> Self {
        Self {
            phase: Phase::Startup,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Leave the startup phase; from now on every error is discarded
    pub fn finish_startup(&mut self) {
        self.phase = Phase::Running;
    }

    pub fn classify(&self, kind: ErrorKind, major_opcode: u8) -> Disposition {
        let redirect_taken = kind == ErrorKind::Access
            && major_opcode == CHANGE_WINDOW_ATTRIBUTES_REQUEST;

        if self.phase == Phase::Startup && redirect_taken {
            Disposition::Fatal
        } else {
            Disposition::Discard
        }
    }

    /// Apply the policy to an error read from the event queue
    pub fn handle(&self, kind: ErrorKind, major_opcode: u8) -> Disposition {
        let disposition = self.classify(kind, major_opcode);
        if disposition == Disposition::Discard {
            trace!("Discarding X11 error {:?} (major opcode {})", kind, major_opcode);
        }
        disposition
    }

    /// Judge the checked reply of the substructure-redirect request on the root
    pub fn check_redirect(&self, result: Result<(), ReplyError>) -> Result<(), StartupError> {
        match result {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(e)) => match self.handle(e.error_kind, e.major_opcode) {
                Disposition::Fatal => Err(StartupError::AnotherWmRunning),
                Disposition::Discard => Ok(()),
            },
            Err(ReplyError::ConnectionError(e)) => Err(StartupError::ConnectionLost(e)),
        }
    }
}
