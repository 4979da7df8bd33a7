//! Command-line interface definition for hotbox.
//!
//! Every flag except the logging switches is optional here: an omitted flag
//! leaves the value from `hotbox.toml`, the environment, or the built-in
//! default in place (see [`crate::config::ServerConfig::load`]).


use clap::Parser;
use std::path::PathBuf;

/// hotbox - serve a source tree with on-demand TypeScript/Elm compilation
#[derive(Parser, Debug, Default)]
#[command(
    name = "hotbox",
    version,
    about = "Serve a source tree with on-demand TypeScript/Elm compilation and live reload",
    long_about = "hotbox serves a directory over HTTP. `.ts` files are compiled to JavaScript\n\
                  in-process, `.elm` files through `elm make`, everything else is served as-is.\n\
                  Served files are watched; a change pushes a reload event to every open tab\n\
                  through the /reload Server-Sent-Events endpoint."
)]
pub struct Cli {
    /// HTTP service address [default: localhost:8080]
    #[arg(long, value_name = "ADDR")]
    pub addr: Option<String>,

    /// Root directory to serve [default: ./src]
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Path to a hotbox.toml config file
    ///
    /// Without this flag, ./hotbox.toml is read when it exists.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Don't open the browser on start
    #[arg(long)]
    pub no_open: bool,

    /// How long a request waits for a compile before failing [default: 2000]
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}
