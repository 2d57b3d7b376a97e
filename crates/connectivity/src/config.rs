//! Observer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between reachability probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default timeout for a single TCP probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Default endpoint probed by [`crate::TcpProbeSource`].
pub const DEFAULT_PROBE_ADDR: &str = "1.1.1.1:443";

fn millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Milliseconds between probes.
    pub poll_interval_ms: u64,
    /// Milliseconds before a probe counts as unreachable.
    pub probe_timeout_ms: u64,
    /// `host:port` used by the TCP probe.
    pub probe_addr: String,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: millis(DEFAULT_POLL_INTERVAL),
            probe_timeout_ms: millis(DEFAULT_PROBE_TIMEOUT),
            probe_addr: DEFAULT_PROBE_ADDR.to_string(),
        }
    }
}

impl ConnectivityConfig {
    /// Poll interval, clamped so a zero value cannot spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Build the TCP probe described by this config.
    pub fn tcp_probe(&self) -> crate::TcpProbeSource {
        crate::TcpProbeSource::new(self.probe_addr.clone(), self.probe_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{"poll_interval_ms": 500}"#;
        let config: ConnectivityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.probe_timeout(), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(config.probe_addr, DEFAULT_PROBE_ADDR);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = ConnectivityConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
    }
}
