//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{ProxyConfig, PORT_ENV};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid PORT value '{0}'")]
    Port(String),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Settings that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Listening port from the command line.
    pub port: Option<u16>,
}

/// Load configuration from an optional TOML file, apply `PORT` and explicit
/// overrides, then validate.
///
/// Precedence: explicit override > `PORT` > file > built-in defaults.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ProxyConfig, ConfigError> {
    let env_port = std::env::var(PORT_ENV).ok();
    resolve_config(path, env_port.as_deref(), overrides)
}

/// Same as [`load_config`] with the `PORT` value supplied by the caller.
pub fn resolve_config(
    path: Option<&Path>,
    env_port: Option<&str>,
    overrides: &Overrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(raw) = env_port.map(str::trim).filter(|p| !p.is_empty()) {
        config.listener.port = raw
            .parse()
            .map_err(|_| ConfigError::Port(raw.to_string()))?;
    }

    if let Some(port) = overrides.port {
        config.listener.port = port;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
