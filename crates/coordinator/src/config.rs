//! Configuration for the coordinator and its connectivity observer.

use crate::error::ConfigError;
use billboard_connectivity::ConnectivityConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default cooldown after a provider reports `Failed`.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Whole milliseconds in `interval`, saturating at `u64::MAX`.
fn millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Milliseconds before a failed networked provider may be retried.
    pub retry_interval_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: millis(DEFAULT_RETRY_INTERVAL),
        }
    }
}

impl CoordinatorConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn with_retry_interval(interval: Duration) -> Self {
        Self {
            retry_interval_ms: millis(interval),
        }
    }
}

/// Top-level configuration file.
///
/// ```json
/// {
///   "coordinator": { "retry_interval_ms": 30000 },
///   "connectivity": { "poll_interval_ms": 2000, "probe_addr": "1.1.1.1:443" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillboardConfig {
    pub coordinator: CoordinatorConfig,
    pub connectivity: ConnectivityConfig,
}

impl BillboardConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded billboard config");
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_retry_interval() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.retry_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_huge_retry_interval_saturates() {
        let config = CoordinatorConfig::with_retry_interval(Duration::MAX);
        assert_eq!(config.retry_interval_ms, u64::MAX);

        let config = CoordinatorConfig::with_retry_interval(Duration::from_millis(1500));
        assert_eq!(config.retry_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"coordinator": {"retry_interval_ms": 5000}}"#;
        let config = BillboardConfig::from_json_str(json).unwrap();
        assert_eq!(config.coordinator.retry_interval(), Duration::from_secs(5));
        assert_eq!(config.connectivity, ConnectivityConfig::default());

        let empty = BillboardConfig::from_json_str("{}").unwrap();
        assert_eq!(empty, BillboardConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"connectivity": {{"poll_interval_ms": 250}}}}"#).unwrap();

        let config = BillboardConfig::load(file.path()).unwrap();
        assert_eq!(
            config.connectivity.poll_interval(),
            Duration::from_millis(250)
        );
        assert_eq!(config.coordinator, CoordinatorConfig::default());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BillboardConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = BillboardConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
