//! Logging configuration
//!
//! Everything goes to stderr. The filter comes from the run options
//! (`-q`, `-v`, or the config file equivalents); set `DEBUG_LOGGING=1` to
//! get debug output for the activate crates regardless of `-v`.
//!
//! The config file can change verbosity, but its parse errors also need to
//! be logged, so logging starts with the command-line level and is adjusted
//! once the settings are merged.

use activate_core::RunOptions;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
};

const DEBUG_DIRECTIVE: &str =
    "info,activate_linux=debug,activate_core=debug,activate_overlay=debug";

/// Lets the filter be replaced after initialization
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Switch to the filter for the final, merged run options
    pub fn update(&self, run: &RunOptions) {
        let directive = filter_directive(run, debug_logging());
        if let Err(e) = self.filter.reload(EnvFilter::new(directive)) {
            eprintln!("Failed to update log filter: {}", e);
        }
        tracing::debug!(directive, "Log filter updated");
    }
}

fn debug_logging() -> bool {
    std::env::var("DEBUG_LOGGING").is_ok()
}

/// Filter directive for the given run options
pub fn filter_directive(run: &RunOptions, debug_logging: bool) -> &'static str {
    if run.quiet {
        return "off";
    }
    match run.verbose {
        0 if debug_logging => DEBUG_DIRECTIVE,
        0 => "warn",
        1 => DEBUG_DIRECTIVE,
        _ => "trace",
    }
}

/// Initialize stderr logging. Call once, before anything logs.
pub fn init(run: &RunOptions) -> LogHandle {
    let debug_logging = debug_logging();
    let filter = EnvFilter::new(filter_directive(run, debug_logging));
    let (filter_layer, filter_handle) = reload::Layer::new(filter);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr_layer)
        .init();

    tracing::debug!(debug_logging, "activate-linux logging initialized");

    LogHandle {
        filter: filter_handle,
    }
}
