//! Settings assembly
//!
//! Layers are applied in increasing priority:
//!
//! 1. built-in defaults plus the system-locale preset
//! 2. the config file given with `-C`
//! 3. command-line flags
//!
//! Each layer only touches the fields it sets. Inside a layer the preset goes
//! first and explicit title/message strings afterwards, so the outcome does not
//! depend on the order flags appear in.

use std::path::Path;

use activate_types::{Color, DrawOptions};

use crate::config;
use crate::error::SettingsError;
use crate::presets;

/// Process-level options that are not part of what gets drawn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Fork to the background before starting a backend
    pub daemonize: bool,
    /// Number of verbosity steps requested (`-v` may repeat)
    pub verbose: u8,
    /// Silence all log output
    pub quiet: bool,
}

/// Fully merged configuration for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub draw: DrawOptions,
    pub run: RunOptions,
}

/// Command-line layer. Strings are kept raw so that validation can report
/// the text the user typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub title: Option<String>,
    pub message: Option<String>,
    pub preset: Option<String>,
    pub font: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub scale: Option<String>,
    pub offset_left: Option<i32>,
    pub offset_top: Option<i32>,
    pub bypass_compositor: bool,
    pub gamescope: bool,
    pub daemonize: bool,
    pub verbose: u8,
    pub quiet: bool,
}

impl Overrides {
    /// Run options as given on the command line alone
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            daemonize: self.daemonize,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Settings {
    /// Defaults with title and subtitle taken from the system locale
    pub fn with_system_preset() -> Self {
        let mut settings = Self::default();
        presets::apply(None, &mut settings.draw);
        settings
    }

    /// Apply a config file. Read and parse errors are logged and ignored.
    pub fn merge_config_file(&mut self, path: &Path) -> bool {
        config::merge_file(path, self)
    }

    /// Apply the command-line layer
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), SettingsError> {
        let draw = &mut self.draw;

        if let Some(preset) = &overrides.preset {
            presets::apply(Some(preset), draw);
        }
        if let Some(title) = &overrides.title {
            draw.title = Some(title.clone());
        }
        if let Some(message) = &overrides.message {
            draw.subtitle = Some(message.clone());
        }
        if let Some(font) = &overrides.font {
            draw.custom_font = font.clone();
        }
        draw.bold_mode |= overrides.bold;
        draw.slant_mode |= overrides.italic;
        draw.bypass_compositor |= overrides.bypass_compositor;
        draw.gamescope_overlay |= overrides.gamescope;

        if let Some(raw) = &overrides.color {
            draw.text_color = raw
                .parse::<Color>()
                .map_err(|source| SettingsError::InvalidColor {
                    raw: raw.clone(),
                    source,
                })?;
        }
        if let Some(raw) = &overrides.scale {
            draw.scale = parse_scale(raw)?;
        }
        if let Some(width) = overrides.width {
            draw.overlay_width = width;
        }
        if let Some(height) = overrides.height {
            draw.overlay_height = height;
        }
        if let Some(left) = overrides.offset_left {
            draw.offset_left = left;
        }
        if let Some(top) = overrides.offset_top {
            draw.offset_top = top;
        }

        let run = &mut self.run;
        run.daemonize |= overrides.daemonize;
        run.verbose = run.verbose.saturating_add(overrides.verbose);
        run.quiet |= overrides.quiet;

        Ok(())
    }

    /// Check invariants on the merged result. Must pass before any backend
    /// is started.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let scale = self.draw.scale;
        if !scale.is_finite() || scale < 0.0 {
            return Err(SettingsError::InvalidScale {
                raw: scale.to_string(),
            });
        }

        let color = self.draw.text_color;
        if !color.is_valid() || !color.in_range() {
            return Err(SettingsError::ColorOutOfRange { color });
        }

        Ok(())
    }
}

fn parse_scale(raw: &str) -> Result<f32, SettingsError> {
    match raw.trim().parse::<f32>() {
        Ok(scale) if scale.is_finite() && scale >= 0.0 => Ok(scale),
        _ => Err(SettingsError::InvalidScale {
            raw: raw.to_string(),
        }),
    }
}
