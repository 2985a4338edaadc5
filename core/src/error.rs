//! Error types for configuration handling

use std::path::PathBuf;
use thiserror::Error;

use activate_types::{Color, ColorParseError};

/// Errors while reading a config file. Never fatal: the caller logs them and
/// keeps the settings established so far.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that stop the program before any backend starts (exit status 1)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Error occurred during parsing custom scale: {raw:?} is not a non-negative number")]
    InvalidScale { raw: String },

    #[error("Error occurred during parsing custom color {raw:?}")]
    InvalidColor {
        raw: String,
        #[source]
        source: ColorParseError,
    },

    #[error("Error occurred during parsing custom color: {color} has channels outside 0.0-1.0")]
    ColorOutOfRange { color: Color },
}
