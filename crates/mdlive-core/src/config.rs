use std::path::Path;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_RULE_MAX_WIDTH: usize = 80;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub display: DisplayConfig,
    pub streaming: StreamingConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            display: DisplayConfig::default(),
            streaming: StreamingConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_ms: u64,
    /// Route transient stat/read failures to the log instead of dropping them.
    pub report_errors: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            report_errors: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: Option<String>,
    pub conceal: bool,
    pub rule_max_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: None,
            conceal: false,
            rule_max_width: DEFAULT_RULE_MAX_WIDTH,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingConfig {
    pub speed: usize,
    pub endless: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            speed: 0,
            endless: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
