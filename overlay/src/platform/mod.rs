//! Platform abstraction for the watermark overlay
//!
//! Each windowing system is one [`Backend`]. A backend owns its whole
//! lifetime: connect, create the surface, then block in its event loop
//! redrawing through the shared [`Renderer`](crate::renderer::Renderer)
//! until the connection goes away.

use activate_types::DrawOptions;
use thiserror::Error;

#[cfg(feature = "wayland")]
pub mod wayland;

#[cfg(feature = "x11")]
pub mod x11;

#[cfg(any(feature = "wayland", feature = "x11"))]
mod shm;

/// Namespace / class name reported to the compositor or window manager
pub const OVERLAY_NAMESPACE: &str = "activate-linux";

/// Errors that can occur in platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to connect to display server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Required protocol/feature not available
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    /// Buffer/memory allocation failed
    #[error("Buffer error: {0}")]
    BufferError(String),
    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// One windowing-system implementation of the overlay
pub trait Backend {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Process exit status reported when this backend is the last one tried
    /// and it fails
    fn failure_code(&self) -> i32;

    /// Run the overlay until the display connection ends.
    ///
    /// `Ok` means a clean shutdown. All protocol resources are released
    /// before this returns, whatever the outcome.
    fn start(&mut self, options: &DrawOptions) -> Result<(), PlatformError>;
}

/// Information about a connected monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Human-readable name (connector name where available)
    pub name: String,
    /// X position of the monitor in virtual screen space
    pub x: i32,
    /// Y position of the monitor in virtual screen space
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

impl MonitorInfo {
    /// Top-left corner for an overlay of the given size in this monitor's
    /// bottom-right corner, pulled in by the offsets.
    pub fn overlay_origin(
        &self,
        width: u32,
        height: u32,
        offset_left: i32,
        offset_top: i32,
    ) -> (i32, i32) {
        let right = self.x + self.width as i32;
        let bottom = self.y + self.height as i32;
        (
            right - width as i32 - offset_left,
            bottom - height as i32 - offset_top,
        )
    }
}

/// The primary monitor, or the first one if none is flagged primary
pub fn primary_monitor(monitors: &[MonitorInfo]) -> Option<&MonitorInfo> {
    monitors.iter().find(|m| m.is_primary).or(monitors.first())
}
