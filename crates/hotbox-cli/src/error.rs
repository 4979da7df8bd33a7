//! Error handling for the hotbox CLI.
//!
//! Two layers, in the same shape as the rest of the workspace:
//! - [`CliError`] is what commands return and what `main` reports
//! - [`ConfigError`] carries field-level detail for bad configuration
//!
//! Failures on the request path (transform errors, gateway timeouts) are not
//! `CliError`s: they become HTTP responses and never stop the server. See
//! [`crate::dev::ConvertError`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (bad values, unreadable config file)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Directory or file not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors (bind failures, serve loop errors)
    #[error("Server error: {0}")]
    Server(String),

    /// The OS file watcher could not be started
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file given with --config doesn't exist
    #[error("Config file not found: {}\n\nHint: Create hotbox.toml or drop the --config flag", .0.display())]
    NotFound(PathBuf),

    /// Config sources could not be merged or have the wrong types
    #[error("Invalid configuration: {0}\n\nHint: Check hotbox.toml syntax and HOTBOX_* environment variables")]
    Extract(#[from] Box<figment::Error>),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Map a missing-file I/O error to [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }
}

/// Convert a CLI error into a miette report for the final exit message.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Config(e) => miette::miette!("{}", e),
        CliError::Watch(e) => miette::miette!(
            "File watcher error: {}\n\nHint: On Linux, raise fs.inotify.max_user_watches if the limit is exhausted",
            e
        ),
        other => miette::miette!("{}", other),
    }
}
