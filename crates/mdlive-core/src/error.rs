use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a document for display. Both variants end up on the
/// error panel; neither is fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Error: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) => path,
            Self::Read { path, .. } => path,
        }
    }
}

/// Transient failure during a poll tick.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to stat '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
