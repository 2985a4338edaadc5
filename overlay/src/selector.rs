//! Backend selection
//!
//! Which backends exist is decided at build time by the `wayland` and `x11`
//! features. With both, Wayland runs first and X11 is the one and only
//! fallback. With one, it runs directly.

use activate_types::DrawOptions;
use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{Backend, PlatformError};

/// The last backend tried failed
#[derive(Debug, Error)]
#[error("{backend} backend failed: {source}")]
pub struct BackendFailure {
    pub backend: &'static str,
    /// Process exit status to report
    pub exit_code: i32,
    #[source]
    pub source: PlatformError,
}

/// Run one backend and report its outcome
pub fn start_backend<B: Backend>(
    backend: &mut B,
    options: &DrawOptions,
) -> Result<(), BackendFailure> {
    info!(backend = backend.name(), "Starting overlay backend");
    backend.start(options).map_err(|source| BackendFailure {
        backend: backend.name(),
        exit_code: backend.failure_code(),
        source,
    })
}

/// Run `primary`; if it fails, run `last_resort` once and return its result
pub fn start_with_fallback<P: Backend, L: Backend>(
    primary: &mut P,
    last_resort: &mut L,
    options: &DrawOptions,
) -> Result<(), BackendFailure> {
    match start_backend(primary, options) {
        Ok(()) => Ok(()),
        Err(failure) => {
            warn!(
                backend = failure.backend,
                error = %failure.source,
                fallback = last_resort.name(),
                "Backend failed, falling back"
            );
            start_backend(last_resort, options)
        }
    }
}

/// Show the overlay with whatever backends this build includes
#[cfg(all(feature = "wayland", feature = "x11"))]
pub fn run(options: &DrawOptions) -> Result<(), BackendFailure> {
    use crate::platform::wayland::WaylandBackend;
    use crate::platform::x11::X11Backend;

    start_with_fallback(&mut WaylandBackend, &mut X11Backend, options)
}

/// Show the overlay with whatever backends this build includes
#[cfg(all(feature = "wayland", not(feature = "x11")))]
pub fn run(options: &DrawOptions) -> Result<(), BackendFailure> {
    start_backend(&mut crate::platform::wayland::WaylandBackend, options)
}

/// Show the overlay with whatever backends this build includes
#[cfg(all(feature = "x11", not(feature = "wayland")))]
pub fn run(options: &DrawOptions) -> Result<(), BackendFailure> {
    start_backend(&mut crate::platform::x11::X11Backend, options)
}

/// Show the overlay with whatever backends this build includes
#[cfg(not(any(feature = "wayland", feature = "x11")))]
pub fn run(_options: &DrawOptions) -> Result<(), BackendFailure> {
    Err(BackendFailure {
        backend: "none",
        exit_code: 1,
        source: PlatformError::UnsupportedFeature("no backend compiled in".to_string()),
    })
}
