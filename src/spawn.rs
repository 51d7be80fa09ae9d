//! Process Spawner
//!
//! Launches shell commands fully detached from the window manager using a
//! double fork: the intermediate child exits at once, so the command ends up
//! orphaned and reparented away from us. Combined with ignoring SIGCHLD for
//! the whole process, nothing we launch can linger as a zombie.

use anyhow::{Context, Result};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{fork, ForkResult, Pid};
use std::ffi::{c_char, CStr, CString};
use std::os::fd::RawFd;
use std::ptr;
use tracing::{debug, info};

const SHELL: &CStr = c"/bin/sh";

/// Ignore SIGCHLD for the lifetime of the process so children are reaped by the kernel
pub fn ignore_child_signals() -> Result<()> {
    // SAFETY: installing SIG_IGN does not run any handler code
    unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) }
        .context("Failed to ignore SIGCHLD")?;
    debug!("SIGCHLD ignored");
    Ok(())
}

/// Run `command` through `/bin/sh -c` without waiting for it
///
/// `inherited_fd` is the display connection descriptor; the command must not
/// keep a second handle on it. Returns the pid of the short-lived
/// intermediate process, not of the command.
pub fn spawn(command: &str, inherited_fd: Option<RawFd>) -> Result<Pid> {
    info!("Launching: {}", command);

    // Everything the children need is allocated up front: after fork only
    // async-signal-safe calls are made.
    let command = CString::new(command).context("Command contains a NUL byte")?;
    let argv: [*const c_char; 4] = [
        c"sh".as_ptr(),
        c"-c".as_ptr(),
        command.as_ptr(),
        ptr::null(),
    ];

    // SAFETY: the child branches below only call async-signal-safe functions
    // and never return into Rust code that assumes a single owner of the heap.
    match unsafe { fork() }.context("Failed to fork")? {
        ForkResult::Parent { child } => {
            debug!("Forked intermediate process {}", child);
            Ok(child)
        }
        ForkResult::Child => {
            // SAFETY: see above
            unsafe {
                match fork() {
                    Ok(ForkResult::Child) => exec_detached(inherited_fd, &argv),
                    Ok(ForkResult::Parent { .. }) => libc::_exit(0),
                    Err(_) => libc::_exit(1),
                }
            }
        }
    }
}

/// Grandchild side: drop the display descriptor, start a new session, exec
unsafe fn exec_detached(inherited_fd: Option<RawFd>, argv: &[*const c_char; 4]) -> ! {
    unsafe {
        if let Some(fd) = inherited_fd {
            libc::close(fd);
        }

        // Undo the manager's SIG_IGN so the command can wait on its own children
        libc::signal(libc::SIGCHLD, libc::SIG_DFL);
        libc::setsid();
        libc::execv(SHELL.as_ptr(), argv.as_ptr());

        libc::_exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_with_nul_are_rejected_before_forking() {
        assert!(spawn("echo \0 oops", None).is_err());
    }
}
