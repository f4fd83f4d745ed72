//! Config resolution (CLI → env → XDG → defaults).
//!
//! The first file found wins; its values are then layered with environment
//! overrides. CLI flag overrides are applied by the caller after resolution.

use crate::config::Config;
use crate::validate::validate;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "STOPSTATS_CONFIG";
pub const ENV_DATA_DIR: &str = "STOPSTATS_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "STOPSTATS_OUTPUT_DIR";
pub const ENV_YEAR: &str = "STOPSTATS_YEAR";

const APP_DIR: &str = "stopstats";

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
    #[error("failed to parse {format} config: {message}")]
    Parse { format: String, message: String },
    #[error("invalid value {value:?} for {var}")]
    InvalidOverride { var: String, value: String },
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<ConfigError> for stops_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(messages) => stops_common::Error::InvalidConfig(messages.join("; ")),
            other => stops_common::Error::Config(other.to_string()),
        }
    }
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Env(PathBuf),
    Xdg(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "cli:{}", p.display()),
            ConfigSource::Env(p) => write!(f, "env:{}", p.display()),
            ConfigSource::Xdg(p) => write!(f, "xdg:{}", p.display()),
            ConfigSource::Defaults => write!(f, "defaults"),
        }
    }
}

/// Candidate config locations, in priority order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path passed with `--config`.
    pub explicit: Option<PathBuf>,
    /// Path taken from `STOPSTATS_CONFIG`.
    pub env: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME/stopstats`, if a config dir exists on this platform.
    pub xdg_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover paths from the process environment.
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            env: std::env::var_os(ENV_CONFIG).map(PathBuf::from),
            xdg_dir: dirs::config_dir().map(|d| d.join(APP_DIR)),
        }
    }
}

/// A configuration together with its origin.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Resolve, layer env overrides, and validate.
pub fn resolve_config(
    paths: &ConfigPaths,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let (mut config, source) = if let Some(path) = &paths.explicit {
        (load_config_from_path(path)?, ConfigSource::Explicit(path.clone()))
    } else if let Some(path) = &paths.env {
        (load_config_from_path(path)?, ConfigSource::Env(path.clone()))
    } else if let Some(path) = paths.xdg_dir.as_deref().and_then(find_in_dir) {
        (load_config_from_path(&path)?, ConfigSource::Xdg(path))
    } else {
        (Config::default(), ConfigSource::Defaults)
    };
    debug!(source = %source, "config resolved");

    apply_env_overrides(&mut config, env)?;
    ensure_valid(&config)?;
    Ok(ResolvedConfig { config, source })
}

/// Fail with every validation message if the config is not valid.
pub fn ensure_valid(config: &Config) -> Result<(), ConfigError> {
    let result = validate(config);
    if result.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(
            result.errors.iter().map(ToString::to_string).collect(),
        ))
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    ["config.toml", "config.json"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Apply `STOPSTATS_*` overrides on top of a loaded config.
pub fn apply_env_overrides(
    config: &mut Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(dir) = env(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(dir) = env(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(year) = env(ENV_YEAR).filter(|v| !v.is_empty()) {
        config.rollup.year = year
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOverride {
                var: ENV_YEAR.to_string(),
                value: year.clone(),
            })?;
    }
    Ok(())
}

/// Load a config from a file path, choosing the parser by extension.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = detect_format(path)?;
    parse_config_str(&content, format)
}

fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "toml" => Ok(ConfigFormat::Toml),
        "json" => Ok(ConfigFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat { extension: ext }),
    }
}

/// Parse a config from a string.
pub fn parse_config_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        format: format.as_str().to_string(),
        message,
    };
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}
