//! activate-linux overlay library
//!
//! Draws the watermark onto a transparent, click-through surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    selector                         │
//! │        Wayland first, X11 as the single fallback    │
//! ├─────────────────────────────────────────────────────┤
//! │                    platform/                        │
//! │              wayland, x11 (Backend)                 │
//! │        (surface setup + blocking event loop)        │
//! ├─────────────────────────────────────────────────────┤
//! │                    renderer                         │
//! │            tiny-skia + cosmic-text                  │
//! │        (title and subtitle into RGBA pixels)        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod platform;
pub mod renderer;
pub mod selector;

#[cfg(test)]
mod selector_tests;

pub use platform::{Backend, PlatformError};
pub use renderer::{Renderer, TextLayout};
pub use selector::{BackendFailure, run};
