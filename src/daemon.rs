//! Moving the process to the background

use nix::unistd::{ForkResult, Pid, fork, setsid};
use tracing::{debug, error, warn};

/// Which side of the fork we are on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Original process; should exit right away
    Parent(Pid),
    /// Detached child, or the original process if forking failed
    Overlay,
}

/// Fork and detach from the controlling terminal.
///
/// Must run before any display connection is opened or thread is spawned.
/// A failed fork is logged and the overlay keeps running in the foreground.
pub fn daemonize() -> Role {
    // SAFETY: called from main before any other thread exists
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(%child, "Forked overlay into the background");
            Role::Parent(child)
        }
        Ok(ForkResult::Child) => {
            if let Err(e) = setsid() {
                warn!(error = %e, "setsid failed, staying in the parent session");
            }
            Role::Overlay
        }
        Err(e) => {
            error!(error = %e, "Failed to daemonize, running in the foreground");
            Role::Overlay
        }
    }
}
