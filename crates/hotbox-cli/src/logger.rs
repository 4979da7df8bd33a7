//! Logging setup for hotbox.
//!
//! Actors log through `tracing`; this module installs the subscriber that
//! prints those events. Verbosity resolves in this order:
//!
//! 1. `--verbose`: DEBUG for hotbox crates (cache hits, watch churn)
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`: custom filter
//! 4. Default: INFO for hotbox crates (per-request timing, reload broadcasts)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "hotbox=debug,hotbox_cli=debug,hotbox_transform=debug";
const QUIET_FILTER: &str = "hotbox=error,hotbox_cli=error,hotbox_transform=error";
const DEFAULT_FILTER: &str = "hotbox=info,hotbox_cli=info,hotbox_transform=info";

/// Build the filter for the given flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the global tracing subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false) // Module paths add noise to request lines
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}
