//! hotbox - a development server that compiles on request.
//!
//! Serves a directory over HTTP. TypeScript is compiled in-process, Elm
//! through `elm make`, and everything else is served as-is. Results are
//! cached until the file changes; a change evicts the entry and pushes a
//! reload event to every browser tab listening on `/reload`.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line flags
//! - [`config`] - Layered configuration (defaults, `hotbox.toml`, env, flags)
//! - [`dev`] - Cache workers, watcher, router, notification bus, HTTP handlers
//! - [`commands`] - The serve command that wires them together
//! - [`error`] - Startup error types
//! - [`logger`] - `tracing` subscriber setup
//! - [`ui`] - Colored status lines
//!
//! # Example
//!
//! ```rust
//! use hotbox_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use config::ServerConfig;
pub use error::{CliError, ConfigError, Result, ResultExt};
