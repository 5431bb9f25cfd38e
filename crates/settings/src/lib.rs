//! Layered configuration for the BMH injection tooling.
//!
//! Values are resolved lowest to highest precedence from built-in defaults, an
//! optional YAML file, the environment variables used by the provisioning
//! automation, and finally explicit [`Overrides`] (usually CLI flags).
//!
//! # Sample Config
//! ```yaml
//! work_dir: /data
//! cluster_id: 0b1f6c2e-4f2a-4bd4-8a57-3d2b1b6a9c11
//! inventory_endpoint: http://assisted-service:8090
//! inventory_timeout_secs: 30
//! correlation: positional
//! logging:
//!   max_level: DEBUG
//!   log_file: /var/log/ignition-bmh.log
//! ```

use std::path::{Path, PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, File};
use models::CorrelationStrategy;
use serde::Deserialize;
use strum_macros::Display;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

/// Config file picked up when no explicit `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config_data/config.yaml";

pub const DEFAULT_IGNITION_FILE_NAME: &str = "bootstrap.ign";
pub use inventory_client::DEFAULT_TIMEOUT_SECS as DEFAULT_INVENTORY_TIMEOUT_SECS;

/// Environment variables read by [`load`], mapped to their settings key.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("WORK_DIR", "work_dir"),
    ("INSTALLER_CONFIG", "installer_config"),
    ("CLUSTER_ID", "cluster_id"),
    ("INVENTORY_ENDPOINT", "inventory_endpoint"),
    ("INVENTORY_TIMEOUT", "inventory_timeout_secs"),
    ("LOG_LEVEL", "logging.max_level"),
    ("LOG_FILE", "logging.log_file"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("loading configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("missing required setting `{key}` (set it in the config file, via {env}, or on the command line)")]
    Missing { key: &'static str, env: &'static str },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Directory holding the installer binary; `installer_dir` is created below it.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Raw install-config.yaml text, written out if the file is not already present.
    #[serde(default)]
    pub installer_config: Option<String>,

    #[serde(default)]
    pub cluster_id: Option<String>,

    #[serde(default)]
    pub inventory_endpoint: Option<String>,

    #[serde(default = "default_inventory_timeout")]
    pub inventory_timeout_secs: u64,

    #[serde(default)]
    pub correlation: CorrelationStrategy,

    #[serde(default = "default_ignition_file_name")]
    pub ignition_file_name: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_inventory_timeout() -> u64 {
    DEFAULT_INVENTORY_TIMEOUT_SECS
}

fn default_ignition_file_name() -> String {
    DEFAULT_IGNITION_FILE_NAME.to_owned()
}

impl Settings {
    /// The inventory endpoint, treating an empty string as "not configured".
    pub fn inventory_endpoint(&self) -> Option<&str> {
        self.inventory_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub fn cluster_id(&self) -> Result<&str, SettingsError> {
        self.cluster_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(SettingsError::Missing {
                key: "cluster_id",
                env: "CLUSTER_ID",
            })
    }

    pub fn work_dir(&self) -> Result<&Path, SettingsError> {
        self.work_dir.as_deref().ok_or(SettingsError::Missing {
            key: "work_dir",
            env: "WORK_DIR",
        })
    }

    pub fn inventory_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.inventory_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum LoggingLevel {
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
    OFF,
}

impl<'de> Deserialize<'de> for LoggingLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = String::deserialize(deserializer)?;

        Ok(match v.to_ascii_uppercase().as_str() {
            "ERROR" => Self::ERROR,
            "WARN" => Self::WARN,
            "INFO" => Self::INFO,
            "DEBUG" => Self::DEBUG,
            "TRACE" => Self::TRACE,
            "OFF" => Self::OFF,
            other => Err(serde::de::Error::custom(format!(
                "Bad logging level specifier {other}"
            )))?,
        })
    }
}

impl From<LoggingLevel> for LevelFilter {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::ERROR => LevelFilter::ERROR,
            LoggingLevel::WARN => LevelFilter::WARN,
            LoggingLevel::INFO => LevelFilter::INFO,
            LoggingLevel::DEBUG => LevelFilter::DEBUG,
            LoggingLevel::TRACE => LevelFilter::TRACE,
            LoggingLevel::OFF => LevelFilter::OFF,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub max_level: LoggingLevel,
}

/// Highest-precedence values, normally taken from command line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cluster_id: Option<String>,
    pub inventory_endpoint: Option<String>,
    pub correlation: Option<CorrelationStrategy>,
}

/// Loads settings using the process environment.
pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Settings, SettingsError> {
    load_with_env(config_file, |name| std::env::var(name).ok(), overrides)
}

/// Same as [`load`], with environment lookups going through `env`.
pub fn load_with_env<F>(
    config_file: Option<&Path>,
    env: F,
    overrides: &Overrides,
) -> Result<Settings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder();

    builder = match config_file {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };

    for (var, key) in ENV_KEYS {
        builder = set_if_present(builder, key, env(var))?;
    }

    builder = set_if_present(builder, "cluster_id", overrides.cluster_id.clone())?;
    builder = set_if_present(
        builder,
        "inventory_endpoint",
        overrides.inventory_endpoint.clone(),
    )?;
    builder = set_if_present(
        builder,
        "correlation",
        overrides.correlation.map(|c| c.to_string()),
    )?;

    Ok(builder.build()?.try_deserialize()?)
}

fn set_if_present(
    builder: ConfigBuilder<DefaultState>,
    key: &str,
    value: Option<String>,
) -> Result<ConfigBuilder<DefaultState>, SettingsError> {
    match value {
        Some(v) => Ok(builder.set_override(key, v)?),
        None => Ok(builder),
    }
}
