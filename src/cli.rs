//! Command-line interface

use std::path::PathBuf;

use activate_core::Overrides;
use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "activate-linux",
    about = "The \"Activate Windows\" watermark ported to Linux",
    disable_version_flag = true
)]
pub struct Cli {
    /// Set title text (e.g. "Activate Linux")
    #[arg(short = 't', long, value_name = "TITLE")]
    pub text_title: Option<String>,

    /// Set message text (e.g. "Go to Settings to activate Linux.")
    #[arg(short = 'm', long, value_name = "MESSAGE")]
    pub text_message: Option<String>,

    /// Use a predefined title and message (see --text-preset-list)
    #[arg(short = 'p', long, value_name = "PRESET")]
    pub text_preset: Option<String>,

    /// Font family for both lines
    #[arg(short = 'f', long, value_name = "FONT")]
    pub text_font: Option<String>,

    /// Bold text
    #[arg(short = 'b', long)]
    pub text_bold: bool,

    /// Italic text
    #[arg(short = 'i', long)]
    pub text_italic: bool,

    /// Text color as r-g-b-a, each channel in 0.0..=1.0
    #[arg(short = 'c', long, value_name = "R-G-B-A")]
    pub text_color: Option<String>,

    /// Overlay width before scaling
    #[arg(short = 'x', long, value_name = "WIDTH", allow_negative_numbers = true)]
    pub overlay_width: Option<i32>,

    /// Overlay height before scaling
    #[arg(short = 'y', long, value_name = "HEIGHT", allow_negative_numbers = true)]
    pub overlay_height: Option<i32>,

    /// Scale factor for the whole overlay
    #[arg(short = 's', long, value_name = "SCALE", allow_negative_numbers = true)]
    pub scale: Option<String>,

    /// Distance from the right screen edge
    #[arg(short = 'H', long, value_name = "PIXELS", allow_negative_numbers = true)]
    pub overlay_offset_left: Option<i32>,

    /// Distance from the bottom screen edge
    #[arg(short = 'V', long, value_name = "PIXELS", allow_negative_numbers = true)]
    pub overlay_offset_top: Option<i32>,

    /// Ask the compositor not to composite the overlay (X11)
    #[arg(short = 'w', long, alias = "skip-compositior")]
    pub skip_compositor: bool,

    /// Mark the window as a gamescope external overlay
    #[arg(short = 'G', long)]
    pub gamescope: bool,

    /// Fork to the background
    #[arg(short = 'd', long)]
    pub daemonize: bool,

    /// More log output (repeat for more)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// No log output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// List available presets and exit
    #[arg(short = 'l', long)]
    pub text_preset_list: bool,

    /// Read settings from a TOML config file
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,
}

impl Cli {
    /// The command-line layer of the settings
    pub fn overrides(&self) -> Overrides {
        Overrides {
            title: self.text_title.clone(),
            message: self.text_message.clone(),
            preset: self.text_preset.clone(),
            font: self.text_font.clone(),
            bold: self.text_bold,
            italic: self.text_italic,
            color: self.text_color.clone(),
            width: self.overlay_width,
            height: self.overlay_height,
            scale: self.scale.clone(),
            offset_left: self.overlay_offset_left,
            offset_top: self.overlay_offset_top,
            bypass_compositor: self.skip_compositor,
            gamescope: self.gamescope,
            daemonize: self.daemonize,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}
