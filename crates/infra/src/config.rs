//! Configuration loading and representation.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML file, then
//! `INVOICE_BUILDER_*` environment variables. Command-line flags are layered
//! on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoice_builder_core::Percentage;
use invoice_builder_invoicing::DEFAULT_TAX_RATE;
use invoice_builder_observability::LogFormat;

use crate::repository::DEFAULT_STORAGE_KEY;
use crate::session::{CorruptStatePolicy, SessionOptions};
use crate::storage::validate_key;

pub const ENV_DATA_DIR: &str = "INVOICE_BUILDER_DATA_DIR";
pub const ENV_TAX_RATE: &str = "INVOICE_BUILDER_TAX_RATE";
pub const ENV_DISCOUNT_RATE: &str = "INVOICE_BUILDER_DISCOUNT_RATE";
pub const ENV_LOG_FORMAT: &str = "INVOICE_BUILDER_LOG_FORMAT";

const APP_DIR_NAME: &str = "invoice-builder";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {value:?} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding `<key>.json`. `None` means the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub key: String,
    pub on_corrupt: CorruptStatePolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
            on_corrupt: CorruptStatePolicy::Reset,
        }
    }
}

/// Rates a new session starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub tax_rate: f64,
    pub discount_rate: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            discount_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Load from `path` (if any), apply process environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Like [`AppConfig::load`] with an injected environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse without validating; call [`AppConfig::validate`] afterwards.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `INVOICE_BUILDER_*` overrides. Empty values are ignored.
    pub fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_TAX_RATE) {
            self.defaults.tax_rate = parse_rate(ENV_TAX_RATE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DISCOUNT_RATE) {
            self.defaults.discount_rate = parse_rate(ENV_DISCOUNT_RATE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = raw
                .parse()
                .map_err(|e: invoice_builder_observability::UnknownLogFormat| {
                    ConfigError::invalid(ENV_LOG_FORMAT, &raw, e.to_string())
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_key(&self.storage.key).map_err(|e| {
            ConfigError::invalid("storage.key", &self.storage.key, e.to_string())
        })?;

        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::invalid("storage.data_dir", "", "must not be empty"));
            }
        }

        check_rate("defaults.tax_rate", self.defaults.tax_rate)?;
        check_rate("defaults.discount_rate", self.defaults.discount_rate)?;
        Ok(())
    }

    /// The directory entries are stored under, with `~` expanded.
    ///
    /// Falls back to `<platform data dir>/invoice-builder`, then to a
    /// `.invoice-builder` directory in the working directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => expand_home(dir),
            None => dirs::data_local_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}"))),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            tax_rate: Percentage::new(self.defaults.tax_rate),
            discount_rate: Percentage::new(self.defaults.discount_rate),
            on_corrupt: self.storage.on_corrupt,
        }
    }
}

fn parse_rate(field: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, raw, "expected a number"))?;
    check_rate(field, value)?;
    Ok(value)
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(
            field,
            value,
            "must be a finite, non-negative percentage",
        ));
    }
    Ok(())
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
