//! Fallback chain tests with simulated backends

use activate_types::DrawOptions;

use crate::platform::{Backend, PlatformError};
use crate::selector::{start_backend, start_with_fallback};

/// Backend that records its calls and returns a canned outcome
struct FakeBackend {
    name: &'static str,
    code: i32,
    fail_with: Option<fn() -> PlatformError>,
    calls: usize,
    seen_titles: Vec<Option<String>>,
}

impl FakeBackend {
    fn ok(name: &'static str, code: i32) -> Self {
        Self {
            name,
            code,
            fail_with: None,
            calls: 0,
            seen_titles: Vec::new(),
        }
    }

    fn failing(name: &'static str, code: i32, fail_with: fn() -> PlatformError) -> Self {
        Self {
            fail_with: Some(fail_with),
            ..Self::ok(name, code)
        }
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn failure_code(&self) -> i32 {
        self.code
    }

    fn start(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        self.calls += 1;
        self.seen_titles.push(options.title.clone());
        match self.fail_with {
            Some(make_error) => Err(make_error()),
            None => Ok(()),
        }
    }
}

fn no_compositor() -> PlatformError {
    PlatformError::UnsupportedFeature("zwlr_layer_shell_v1".to_string())
}

fn no_display() -> PlatformError {
    PlatformError::ConnectionFailed("unable to open display".to_string())
}

fn options() -> DrawOptions {
    DrawOptions {
        title: Some("ACTIVATE".to_string()),
        ..DrawOptions::default()
    }
}

#[test]
fn test_primary_success_skips_fallback() {
    let mut wayland = FakeBackend::ok("Wayland", 3);
    let mut x11 = FakeBackend::ok("X11", 2);

    assert!(start_with_fallback(&mut wayland, &mut x11, &options()).is_ok());
    assert_eq!(wayland.calls, 1);
    assert_eq!(x11.calls, 0);
}

#[test]
fn test_primary_failure_runs_fallback_once() {
    let mut wayland = FakeBackend::failing("Wayland", 3, no_compositor);
    let mut x11 = FakeBackend::ok("X11", 2);

    assert!(start_with_fallback(&mut wayland, &mut x11, &options()).is_ok());
    assert_eq!(wayland.calls, 1, "primary is never retried");
    assert_eq!(x11.calls, 1);
    assert_eq!(x11.seen_titles, vec![Some("ACTIVATE".to_string())]);
}

#[test]
fn test_fallback_result_is_final() {
    let mut wayland = FakeBackend::failing("Wayland", 3, no_compositor);
    let mut x11 = FakeBackend::failing("X11", 2, no_display);

    let failure = start_with_fallback(&mut wayland, &mut x11, &options()).unwrap_err();
    assert_eq!(failure.backend, "X11");
    assert_eq!(failure.exit_code, 2);
    assert!(matches!(failure.source, PlatformError::ConnectionFailed(_)));
    assert_eq!((wayland.calls, x11.calls), (1, 1));
}

#[test]
fn test_single_backend_runs_unconditionally() {
    let mut only = FakeBackend::failing("Wayland", 3, no_compositor);

    let failure = start_backend(&mut only, &options()).unwrap_err();
    assert_eq!(only.calls, 1);
    assert_eq!(failure.backend, "Wayland");
    assert_eq!(failure.exit_code, 3);

    let mut healthy = FakeBackend::ok("X11", 2);
    assert!(start_backend(&mut healthy, &options()).is_ok());
    assert_eq!(healthy.calls, 1);
}

#[test]
fn test_failure_message_names_backend() {
    let mut only = FakeBackend::failing("X11", 2, no_display);
    let failure = start_backend(&mut only, &options()).unwrap_err();
    assert_eq!(
        failure.to_string(),
        "X11 backend failed: Connection failed: unable to open display"
    );
}
