//! activate-linux: the "Activate Windows" watermark for Linux desktops.
//!
//! The binary glues together the workspace crates:
//! - `activate-types`: color and draw options
//! - `activate-core`: presets, config file and settings merge
//! - `activate-overlay`: renderer and the Wayland/X11 backends

pub mod cli;
pub mod daemon;
pub mod logging;

use std::process::ExitCode;

use activate_core::{Settings, presets};
use activate_overlay::BackendFailure;
use tracing::{debug, error, info};

use cli::Cli;

/// Exit status for invalid settings
pub const CONFIG_ERROR_CODE: u8 = 1;

/// Write the preset list, one `id: title` per line
pub fn write_preset_list(out: &mut impl std::io::Write) -> std::io::Result<()> {
    for id in presets::preset_ids() {
        if let Some(preset) = presets::lookup(id) {
            writeln!(out, "{}: {}", id, preset.title)?;
        }
    }
    Ok(())
}

/// Merge defaults, the config file and the command line into one `Settings`
pub fn build_settings(cli: &Cli) -> Result<Settings, activate_core::SettingsError> {
    let mut settings = Settings::with_system_preset();
    if let Some(path) = &cli.config_file {
        settings.merge_config_file(path);
    }
    settings.apply_overrides(&cli.overrides())?;
    settings.validate()?;
    Ok(settings)
}

/// Settings for this run, or the exit status to stop with
pub fn load_settings(cli: &Cli) -> Result<Settings, u8> {
    build_settings(cli).map_err(|e| {
        eprintln!("{}", e);
        CONFIG_ERROR_CODE
    })
}

/// Exit status for a run where every backend failed
pub fn failure_status(failure: &BackendFailure) -> u8 {
    u8::try_from(failure.exit_code).unwrap_or(1)
}

/// Run the program for already-parsed arguments
pub fn run(cli: Cli) -> ExitCode {
    if cli.text_preset_list {
        let mut stdout = std::io::stdout().lock();
        return match write_preset_list(&mut stdout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    }

    let log = logging::init(&cli.overrides().run_options());

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(status) => return ExitCode::from(status),
    };
    log.update(&settings.run);
    debug!(?settings, "Settings merged");

    if settings.run.daemonize
        && let daemon::Role::Parent(_) = daemon::daemonize()
    {
        return ExitCode::SUCCESS;
    }

    match activate_overlay::run(&settings.draw) {
        Ok(()) => {
            info!("Overlay closed");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!(backend = failure.backend, error = %failure.source, "Could not show overlay");
            ExitCode::from(failure_status(&failure))
        }
    }
}
