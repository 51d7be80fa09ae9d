//! Events Module
//!
//! The closed set of X11 events the window manager reacts to. Everything else
//! the server sends is dropped before it reaches the dispatcher.

use x11rb::protocol::xproto::{ConfigureWindowAux, Keycode, Mapping, Window};
use x11rb::protocol::{ErrorKind, Event};

/// An event the dispatcher has a handler for
#[derive(Debug, Clone)]
pub enum WmEvent {
    /// A client asked to change its geometry or stacking
    ConfigureRequest {
        window: Window,
        /// Only the fields named by the request's value mask are set
        changes: ConfigureWindowAux,
    },

    /// A client window wants to be shown
    MapRequest { window: Window },

    /// A window we selected structure events on was unmapped
    UnmapNotify { window: Window },

    /// A window we selected structure events on was destroyed
    DestroyNotify { window: Window },

    /// The pointer entered a client window
    EnterNotify { window: Window },

    /// A grabbed pointer button was pressed
    ButtonPress {
        /// Window the grab was reported on (the root)
        window: Window,
        /// Top-level child under the pointer, or NONE
        subwindow: Window,
    },

    /// A grabbed key combination was pressed
    KeyPress {
        keycode: Keycode,
        /// Raw modifier and button state, unmasked
        state: u16,
    },

    /// The keyboard or modifier mapping changed
    MappingNotify { request: Mapping },

    /// An asynchronous protocol error reported through the event queue
    ProtocolError { kind: ErrorKind, major_opcode: u8 },
}

impl WmEvent {
    /// Convert a raw server event, returning `None` for event kinds with no handler
    pub fn from_x11(event: &Event) -> Option<Self> {
        let converted = match event {
            Event::ConfigureRequest(e) => Self::ConfigureRequest {
                window: e.window,
                changes: ConfigureWindowAux::from_configure_request(e),
            },
            Event::MapRequest(e) => Self::MapRequest { window: e.window },
            Event::UnmapNotify(e) => Self::UnmapNotify { window: e.window },
            Event::DestroyNotify(e) => Self::DestroyNotify { window: e.window },
            Event::EnterNotify(e) => Self::EnterNotify { window: e.event },
            Event::ButtonPress(e) => Self::ButtonPress {
                window: e.event,
                subwindow: e.child,
            },
            Event::KeyPress(e) => Self::KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
            },
            Event::MappingNotify(e) => Self::MappingNotify { request: e.request },
            Event::Error(e) => Self::ProtocolError {
                kind: e.error_kind,
                major_opcode: e.major_opcode,
            },
            _ => return None,
        };

        Some(converted)
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigureRequest { .. } => "ConfigureRequest",
            Self::MapRequest { .. } => "MapRequest",
            Self::UnmapNotify { .. } => "UnmapNotify",
            Self::DestroyNotify { .. } => "DestroyNotify",
            Self::EnterNotify { .. } => "EnterNotify",
            Self::ButtonPress { .. } => "ButtonPress",
            Self::KeyPress { .. } => "KeyPress",
            Self::MappingNotify { .. } => "MappingNotify",
            Self::ProtocolError { .. } => "ProtocolError",
        }
    }
}
