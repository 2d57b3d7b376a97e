//! Reachability sources.
//!
//! These abstract the platform facility so the observer logic stays
//! testable. The observer polls a source on its own task.

use crate::status::PathStatus;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;

/// Platform reachability facility.
#[async_trait]
pub trait ReachabilitySource: Send + Sync {
    /// Determine the current path status.
    async fn probe(&self) -> PathStatus;
}

/// Source that never learns anything. Treated as offline.
pub struct NullSource;

#[async_trait]
impl ReachabilitySource for NullSource {
    async fn probe(&self) -> PathStatus {
        PathStatus::Unknown
    }
}

/// Source whose status is set by the host or by tests.
pub struct ManualSource {
    status: Mutex<PathStatus>,
}

impl ManualSource {
    pub fn new(status: PathStatus) -> Self {
        Self {
            status: Mutex::new(status),
        }
    }

    pub fn set(&self, status: PathStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn get(&self) -> PathStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new(PathStatus::Unknown)
    }
}

#[async_trait]
impl ReachabilitySource for ManualSource {
    async fn probe(&self) -> PathStatus {
        self.get()
    }
}

/// Source that opens a TCP connection to a well-known endpoint.
///
/// A completed handshake is `Satisfied`; refusal, unreachable network or
/// timeout are `Unsatisfied`.
pub struct TcpProbeSource {
    addr: String,
    timeout: Duration,
}

impl TcpProbeSource {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl ReachabilitySource for TcpProbeSource {
    async fn probe(&self) -> PathStatus {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.addr.as_str())).await {
            Ok(Ok(_stream)) => PathStatus::Satisfied,
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, error = %e, "reachability probe failed");
                PathStatus::Unsatisfied
            }
            Err(_) => {
                tracing::debug!(
                    addr = %self.addr,
                    timeout = ?self.timeout,
                    "reachability probe timed out"
                );
                PathStatus::Unsatisfied
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_null_source_is_unknown() {
        assert_eq!(NullSource.probe().await, PathStatus::Unknown);
    }

    #[tokio::test]
    async fn test_manual_source_reports_latest() {
        let source = ManualSource::default();
        assert_eq!(source.probe().await, PathStatus::Unknown);

        source.set(PathStatus::Satisfied);
        assert_eq!(source.probe().await, PathStatus::Satisfied);
    }

    #[tokio::test]
    async fn test_tcp_probe_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let source = TcpProbeSource::new(addr.to_string(), Duration::from_secs(2));
        assert_eq!(source.probe().await, PathStatus::Satisfied);
    }

    #[tokio::test]
    async fn test_tcp_probe_refused_is_unsatisfied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = TcpProbeSource::new(addr.to_string(), Duration::from_secs(2));
        assert_eq!(source.probe().await, PathStatus::Unsatisfied);
    }
}
