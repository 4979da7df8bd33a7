use crate::cli::Cli;
use crate::config::{ServerConfig, CONFIG_FILE, ENV_PREFIX};
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The subset of settings the command line can override.
///
/// Unset flags are skipped during serialization so they don't mask values
/// from the file or the environment.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_ms: Option<u64>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            addr: cli.addr.clone(),
            root: cli.dir.clone(),
            open: cli.no_open.then_some(false),
            request_timeout_ms: cli.timeout_ms,
        }
    }
}

impl ServerConfig {
    /// Load configuration from every source and validate it.
    /// Priority: CLI args > environment variables > config file > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = Self::figment(cli)?
            .extract::<Self>()
            .map_err(|e| ConfigError::Extract(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    pub(crate) fn figment(cli: &Cli) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file(cli.config.as_deref())? {
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(CliOverrides::from(cli))))
    }
}

/// Pick the config file: an explicit path must exist, the default is optional.
fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::NotFound(path.to_path_buf()).into()),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            Ok(default_path.is_file().then(|| default_path.to_path_buf()))
        }
    }
}
