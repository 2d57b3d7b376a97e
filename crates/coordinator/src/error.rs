//! Error types for provider selection and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures surfaced to the host.
///
/// Individual provider failures never appear here; the coordinator absorbs
/// them by advancing to the next provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Every eligible provider was tried and none had content.
    #[error("no provider has content to display")]
    Exhausted,

    /// A later reload, cancel or reset replaced the pass before it finished.
    #[error("selection pass was superseded before it finished")]
    Superseded,

    /// The coordinator task is no longer running.
    #[error("coordinator service has stopped")]
    ServiceStopped,
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
