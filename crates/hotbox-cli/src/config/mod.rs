//! Server configuration with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and `hotbox.toml`.
//! Priority: CLI > Environment > File > Defaults

mod loading;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Config file read from the working directory when `--config` isn't given.
pub const CONFIG_FILE: &str = "hotbox.toml";

/// Prefix for environment overrides (`HOTBOX_ADDR`, `HOTBOX_ROOT`, ...).
pub const ENV_PREFIX: &str = "HOTBOX_";

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on; host names are resolved at bind time
    pub addr: String,

    /// Directory served at `/`
    pub root: PathBuf,

    /// Open the default browser once the server is listening
    pub open: bool,

    /// How long a request waits for its cache worker before a 404
    pub request_timeout_ms: u64,

    /// Queued reload events per SSE connection before events are dropped
    pub subscriber_buffer: usize,

    /// Pending watch registrations before new ones are skipped
    pub watch_buffer: usize,

    /// Elm compiler executable
    pub elm_program: String,

    /// Elm dependency finder executable
    pub elm_deps_program: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:8080".to_string(),
            root: PathBuf::from("./src"),
            open: true,
            request_timeout_ms: 2000,
            subscriber_buffer: 16,
            watch_buffer: 64,
            elm_program: "elm".to_string(),
            elm_deps_program: "find-elm-dependencies".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The URL the browser should open.
    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}
