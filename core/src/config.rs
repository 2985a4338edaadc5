//! Config file loading
//!
//! The file is TOML with flat, kebab-case keys mirroring the long command-line
//! options:
//!
//! ```toml
//! text-preset = "bsd"
//! text-title = "Activate BSD"
//! text-bold = true
//! text-color-a = 0.5
//! scale = 1.5
//! overlay-offset-left = 40
//! ```
//!
//! Every key is optional and only keys present in the file override the
//! current settings. A key holding the wrong type is skipped with a warning,
//! the rest of the file still applies. Lines may end in `;` as in older
//! libconfig-style files.

use std::fs;
use std::path::Path;

use activate_types::Color;
use serde::de::DeserializeOwned;
use toml::Table;
use tracing::{debug, error, warn};

use crate::error::ConfigFileError;
use crate::presets;
use crate::settings::Settings;

/// Values read from a config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub text_title: Option<String>,
    pub text_message: Option<String>,
    pub text_font: Option<String>,
    pub text_preset: Option<String>,
    pub text_bold: Option<bool>,
    pub text_italic: Option<bool>,
    pub skip_compositor: Option<bool>,
    pub gamescope: Option<bool>,
    pub daemonize: Option<bool>,
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub text_color_r: Option<f32>,
    pub text_color_g: Option<f32>,
    pub text_color_b: Option<f32>,
    pub text_color_a: Option<f32>,
    pub scale: Option<f32>,
    pub overlay_width: Option<i32>,
    pub overlay_height: Option<i32>,
    pub overlay_offset_top: Option<i32>,
    pub overlay_offset_left: Option<i32>,
}

impl ConfigFile {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigFileError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config text. Only a syntax error fails the whole file.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let table: Table = toml::from_str(&strip_line_terminators(content))?;

        Ok(Self {
            text_title: lookup(&table, "text-title"),
            text_message: lookup(&table, "text-message"),
            text_font: lookup(&table, "text-font"),
            text_preset: lookup(&table, "text-preset"),
            text_bold: lookup(&table, "text-bold"),
            text_italic: lookup(&table, "text-italic"),
            skip_compositor: lookup(&table, "skip-compositor"),
            gamescope: lookup(&table, "gamescope"),
            daemonize: lookup(&table, "daemonize"),
            verbose: lookup(&table, "verbose"),
            quiet: lookup(&table, "quiet"),
            text_color_r: lookup(&table, "text-color-r"),
            text_color_g: lookup(&table, "text-color-g"),
            text_color_b: lookup(&table, "text-color-b"),
            text_color_a: lookup(&table, "text-color-a"),
            scale: lookup(&table, "scale"),
            overlay_width: lookup(&table, "overlay-width"),
            overlay_height: lookup(&table, "overlay-height"),
            overlay_offset_top: lookup(&table, "overlay-offset-top"),
            overlay_offset_left: lookup(&table, "overlay-offset-left"),
        })
    }

    /// Override the fields this file sets.
    ///
    /// The preset is applied before `text-title`/`text-message`, so explicit
    /// strings in the same file win over the preset.
    pub fn apply(&self, settings: &mut Settings) {
        let draw = &mut settings.draw;

        if let Some(preset) = &self.text_preset {
            presets::apply(Some(preset), draw);
        }
        if let Some(title) = &self.text_title {
            draw.title = Some(title.clone());
        }
        if let Some(message) = &self.text_message {
            draw.subtitle = Some(message.clone());
        }
        if let Some(font) = &self.text_font {
            draw.custom_font = font.clone();
        }
        if let Some(bold) = self.text_bold {
            draw.bold_mode = bold;
        }
        if let Some(italic) = self.text_italic {
            draw.slant_mode = italic;
        }
        if let Some(skip) = self.skip_compositor {
            draw.bypass_compositor = skip;
        }
        if let Some(gamescope) = self.gamescope {
            draw.gamescope_overlay = gamescope;
        }

        // Missing channels keep the current color's value
        let current = draw.text_color;
        draw.text_color = Color::new(
            self.text_color_r.unwrap_or(current.r),
            self.text_color_g.unwrap_or(current.g),
            self.text_color_b.unwrap_or(current.b),
            self.text_color_a.unwrap_or(current.a),
        );

        if let Some(scale) = self.scale {
            draw.scale = scale;
        }
        if let Some(width) = self.overlay_width {
            draw.overlay_width = width;
        }
        if let Some(height) = self.overlay_height {
            draw.overlay_height = height;
        }
        if let Some(top) = self.overlay_offset_top {
            draw.offset_top = top;
        }
        if let Some(left) = self.overlay_offset_left {
            draw.offset_left = left;
        }

        let run = &mut settings.run;
        if let Some(daemonize) = self.daemonize {
            run.daemonize = daemonize;
        }
        if self.verbose == Some(true) {
            run.verbose = run.verbose.saturating_add(1);
        }
        if let Some(quiet) = self.quiet {
            run.quiet = quiet;
        }
    }
}

/// Read one key, skipping it when the value has the wrong type
fn lookup<T: DeserializeOwned>(table: &Table, key: &str) -> Option<T> {
    let value = table.get(key)?;
    match value.clone().try_into() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key, %value, error = %e, "Ignoring config key");
            None
        }
    }
}

/// Drop a trailing `;` from each line
fn strip_line_terminators(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let trimmed = line.trim_end();
            trimmed.strip_suffix(';').unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge a config file into `settings`, logging (not returning) any error.
///
/// Returns whether the file was applied.
pub fn merge_file(path: &Path, settings: &mut Settings) -> bool {
    match ConfigFile::load(path) {
        Ok(file) => {
            debug!(path = %path.display(), ?file, "Applying config file");
            file.apply(settings);
            true
        }
        Err(e) => {
            error!(error = %e, cause = ?std::error::Error::source(&e), "Ignoring config file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(content: &str) -> ConfigFile {
        ConfigFile::parse(content).expect("valid config")
    }

    #[test]
    fn test_empty_file_changes_nothing() {
        let mut settings = Settings::default();
        let before = settings.clone();
        parse("").apply(&mut settings);
        assert_eq!(settings, before);
    }

    #[test]
    fn test_all_keys() {
        let file = parse(
            r#"
            text-title = "Title"
            text-message = "Message"
            text-font = "DejaVu Serif"
            text-bold = true
            text-italic = true
            skip-compositor = true
            gamescope = true
            daemonize = true
            verbose = true
            quiet = false
            text-color-r = 0.1
            text-color-g = 0.2
            text-color-b = 0.3
            text-color-a = 0.4
            scale = 2
            overlay-width = 400
            overlay-height = 150
            overlay-offset-top = 10
            overlay-offset-left = 20
            "#,
        );

        let mut settings = Settings::default();
        file.apply(&mut settings);

        let draw = &settings.draw;
        assert_eq!(draw.title.as_deref(), Some("Title"));
        assert_eq!(draw.subtitle.as_deref(), Some("Message"));
        assert_eq!(draw.custom_font, "DejaVu Serif");
        assert!(draw.bold_mode && draw.slant_mode);
        assert!(draw.bypass_compositor && draw.gamescope_overlay);
        assert_eq!(draw.text_color, Color::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(draw.scale, 2.0);
        assert_eq!((draw.overlay_width, draw.overlay_height), (400, 150));
        assert_eq!((draw.offset_left, draw.offset_top), (20, 10));
        assert!(settings.run.daemonize);
        assert_eq!(settings.run.verbose, 1);
        assert!(!settings.run.quiet);
    }

    #[test]
    fn test_color_channels_default_independently() {
        let mut settings = Settings::default();
        parse("text-color-a = 0.5").apply(&mut settings);
        assert_eq!(settings.draw.text_color, Color::new(0.82, 0.82, 0.82, 0.5));
    }

    #[test]
    fn test_explicit_title_beats_preset_in_same_file() {
        let mut settings = Settings::default();
        parse(
            r#"
            text-title = "Mine"
            text-preset = "bsd"
            "#,
        )
        .apply(&mut settings);
        assert_eq!(settings.draw.title.as_deref(), Some("Mine"));
        assert_eq!(
            settings.draw.subtitle.as_deref(),
            Some("Go to Settings to activate BSD.")
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let file = parse("something-else = 3\nscale = 0.5");
        assert_eq!(file.scale, Some(0.5));
    }

    #[test]
    fn test_mistyped_key_skips_only_that_key() {
        let file = parse(
            r#"
            overlay-width = 1.5
            overlay-height = 99999999999
            text-bold = "yes"
            text-title = "Still here"
            overlay-offset-left = 40
            "#,
        );
        assert_eq!(file.overlay_width, None);
        assert_eq!(file.overlay_height, None);
        assert_eq!(file.text_bold, None);
        assert_eq!(file.text_title.as_deref(), Some("Still here"));
        assert_eq!(file.overlay_offset_left, Some(40));
    }

    #[test]
    fn test_integer_accepted_for_float_keys() {
        let file = parse("scale = 2\ntext-color-r = 1");
        assert_eq!(file.scale, Some(2.0));
        assert_eq!(file.text_color_r, Some(1.0));
    }

    #[test]
    fn test_semicolon_terminated_lines() {
        let file = parse(
            r#"
            text-title = "Activate BSD;";
            scale = 1.5;
            text-bold = true;
            "#,
        );
        assert_eq!(file.text_title.as_deref(), Some("Activate BSD;"));
        assert_eq!(file.scale, Some(1.5));
        assert_eq!(file.text_bold, Some(true));
    }

    #[test]
    fn test_merge_file_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "text-title = \"From disk\"").unwrap();

        let mut settings = Settings::default();
        assert!(merge_file(tmp.path(), &mut settings));
        assert_eq!(settings.draw.title.as_deref(), Some("From disk"));
    }

    #[test]
    fn test_unreadable_or_broken_file_is_not_fatal() {
        let mut settings = Settings::default();
        settings.draw.title = Some("Kept".to_string());
        let before = settings.clone();

        assert!(!merge_file(Path::new("/nonexistent/activate-linux.toml"), &mut settings));
        assert_eq!(settings, before);

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "scale = = 1").unwrap();
        assert!(!merge_file(tmp.path(), &mut settings));
        assert_eq!(settings, before);

        assert!(matches!(
            ConfigFile::load(tmp.path()),
            Err(ConfigFileError::Parse { .. })
        ));
    }
}
