//! Error types for configuration and watch setup.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems found while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: &'static str },

    #[error("invalid event mask letter '{0}' (expected any of c, w, r, m, a)")]
    InvalidMask(char),

    #[error("invalid glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("timeout must be greater than 0")]
    ZeroTimeout,

    #[error("no files to watch")]
    NoPaths,

    #[error("no command given")]
    NoCommand,

    #[error("failed to read settings file {}: {source}", path.display())]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {}: {source}", path.display())]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Problems registering paths with the filesystem watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file system watcher: {0}")]
    Backend(#[from] notify::Error),

    #[error("can't watch {}: {source}", path.display())]
    CannotWatch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("none of the given paths could be watched")]
    NothingWatched,
}
