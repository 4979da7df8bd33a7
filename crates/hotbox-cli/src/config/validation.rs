use crate::config::ServerConfig;
use crate::error::{CliError, ConfigError, Result, ResultExt};
use std::path::PathBuf;

impl ServerConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(invalid("addr", &self.addr, "Use host:port, e.g. localhost:8080"));
        }

        if self.request_timeout_ms == 0 {
            return Err(invalid(
                "request_timeout_ms",
                "0",
                "Must be greater than zero; requests would always time out",
            ));
        }

        if self.subscriber_buffer == 0 {
            return Err(invalid(
                "subscriber_buffer",
                "0",
                "Each reload connection needs room for at least one event",
            ));
        }

        if self.watch_buffer == 0 {
            return Err(invalid(
                "watch_buffer",
                "0",
                "The watcher needs room for at least one pending registration",
            ));
        }

        if !self.root.is_dir() {
            if self.root.exists() {
                return Err(invalid(
                    "root",
                    &self.root.display().to_string(),
                    "Must be a directory",
                ));
            }
            return Err(CliError::FileNotFound(self.root.clone()));
        }

        Ok(())
    }

    /// Absolute, symlink-free form of the served root.
    pub fn resolved_root(&self) -> Result<PathBuf> {
        self.root.canonicalize().with_path(&self.root)
    }
}

fn invalid(field: &str, value: &str, hint: &str) -> CliError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    }
    .into()
}
