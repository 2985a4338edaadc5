//! Configuration side of activate-linux: presets, config files and the
//! merged per-run settings handed to the overlay backends.

pub mod config;
pub mod error;
pub mod presets;
pub mod settings;

pub use config::ConfigFile;
pub use error::{ConfigFileError, SettingsError};
pub use settings::{Overrides, RunOptions, Settings};
