//! Shared types for activate-linux
//!
//! This crate contains the value types that travel from configuration
//! (activate-core) into the overlay backends (activate-overlay).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Color Type
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color with float channels in `[0.0, 1.0]`
///
/// Channels are stored as given. A color whose alpha is negative is the
/// "invalid" sentinel produced by [`Color::from_rgba_str`]; check
/// [`Color::is_valid`] before handing a parsed color to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Errors from parsing an `r-g-b-a` color string
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorParseError {
    #[error("expected 4 channels in r-g-b-a notation, found {found}")]
    ChannelCount { found: usize },

    #[error("channel {index} ({raw:?}) is not a number")]
    NotANumber { index: usize, raw: String },

    #[error("channel {index} ({value}) is outside 0.0-1.0")]
    OutOfRange { index: usize, value: f32 },
}

impl Color {
    /// Sentinel returned when a color string cannot be parsed
    pub const INVALID: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: -1.0,
    };

    /// Build a color from four channels. Values are not clamped.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `r-g-b-a` notation, returning [`Color::INVALID`] on any error
    pub fn from_rgba_str(s: &str) -> Self {
        s.parse().unwrap_or(Self::INVALID)
    }

    /// False for the sentinel produced by a failed parse
    pub fn is_valid(&self) -> bool {
        self.a >= 0.0
    }

    /// True when every channel lies inside `[0.0, 1.0]`
    pub fn in_range(&self) -> bool {
        self.channels()
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    pub fn channels(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Convert to 8-bit RGBA, clamping out-of-range channels
    pub fn to_rgba8(&self) -> [u8; 4] {
        self.channels()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

impl Default for Color {
    /// Light grey, fully opaque
    fn default() -> Self {
        Self::new(0.82, 0.82, 0.82, 1.0)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(ColorParseError::ChannelCount { found: parts.len() });
        }

        let mut channels = [0.0f32; 4];
        for (index, (raw, slot)) in parts.iter().zip(channels.iter_mut()).enumerate() {
            let value: f32 = raw.trim().parse().map_err(|_| ColorParseError::NotANumber {
                index,
                raw: raw.to_string(),
            })?;
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ColorParseError::OutOfRange { index, value });
            }
            *slot = value;
        }

        let [r, g, b, a] = channels;
        Ok(Self::new(r, g, b, a))
    }
}

impl fmt::Display for Color {
    /// Formats in the same `r-g-b-a` notation [`FromStr`] accepts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.r, self.g, self.b, self.a)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draw Options
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_OVERLAY_WIDTH: i32 = 340;
pub const DEFAULT_OVERLAY_HEIGHT: i32 = 120;

/// Largest surface side in pixels; X11 window geometry is 16-bit
pub const MAX_SURFACE_SIDE: u32 = i16::MAX as u32;

/// Everything a backend needs to put the watermark on screen.
///
/// Built once at startup (defaults, then config file, then command line) and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOptions {
    /// Large first line. `None` until a preset or explicit value fills it.
    pub title: Option<String>,
    /// Smaller second line
    pub subtitle: Option<String>,
    /// Font family name; empty selects the built-in default
    pub custom_font: String,
    pub bold_mode: bool,
    pub slant_mode: bool,
    /// Multiplier for every rendered dimension, never negative once validated
    pub scale: f32,
    /// Surface width before scaling
    pub overlay_width: i32,
    /// Surface height before scaling
    pub overlay_height: i32,
    /// Horizontal distance from the anchored (right) screen edge
    pub offset_left: i32,
    /// Vertical distance from the anchored (bottom) screen edge
    pub offset_top: i32,
    pub text_color: Color,
    /// Ask X11 compositors to leave the window alone (_NET_WM_BYPASS_COMPOSITOR)
    pub bypass_compositor: bool,
    /// Tag the window as a gamescope external overlay
    pub gamescope_overlay: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            title: None,
            subtitle: None,
            custom_font: String::new(),
            bold_mode: false,
            slant_mode: false,
            scale: 1.0,
            overlay_width: DEFAULT_OVERLAY_WIDTH,
            overlay_height: DEFAULT_OVERLAY_HEIGHT,
            offset_left: 0,
            offset_top: 0,
            text_color: Color::default(),
            bypass_compositor: false,
            gamescope_overlay: false,
        }
    }
}

impl DrawOptions {
    /// Surface size in pixels after scaling, each side in
    /// `1..=MAX_SURFACE_SIDE`.
    pub fn scaled_size(&self) -> (u32, u32) {
        (
            scale_dimension(self.overlay_width, self.scale),
            scale_dimension(self.overlay_height, self.scale),
        )
    }

    /// Title text, or empty when nothing was configured
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn subtitle_text(&self) -> &str {
        self.subtitle.as_deref().unwrap_or_default()
    }
}

fn scale_dimension(value: i32, scale: f32) -> u32 {
    let scaled = (value.max(0) as f32 * scale).round();
    if scaled.is_nan() || scaled < 1.0 {
        1
    } else if scaled >= MAX_SURFACE_SIDE as f32 {
        MAX_SURFACE_SIDE
    } else {
        scaled as u32
    }
}
