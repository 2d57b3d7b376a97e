//! Provider contract.
//!
//! A provider is an external content source (announcements, ads, rating
//! prompts). The coordinator only sees its capability flags and its async
//! fetch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Result of one provider fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Transient problem; retried no sooner than the retry interval.
    Failed,
    /// Provider is healthy but has nothing to show.
    NoContent,
    /// Provider has content ready to display.
    Available,
}

impl FetchOutcome {
    pub fn is_available(self) -> bool {
        matches!(self, FetchOutcome::Available)
    }
}

impl std::fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FetchOutcome::Failed => "failed",
            FetchOutcome::NoContent => "no_content",
            FetchOutcome::Available => "available",
        })
    }
}

/// Capability flags a provider declares to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Content comes from the network.
    pub requires_connectivity: bool,
    /// Content can be rendered from a local cache while offline.
    pub offline_cache_available: bool,
    /// Cooldown after a `NoContent` or `Available` outcome.
    pub refresh_interval: Duration,
    /// The host should re-run selection when its container is resized.
    pub reload_on_resize: bool,
}

impl ProviderCapabilities {
    /// Capabilities of a network-backed provider.
    pub fn online() -> Self {
        Self {
            requires_connectivity: true,
            ..Self::default()
        }
    }

    pub fn with_offline_cache(mut self) -> Self {
        self.offline_cache_available = true;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_reload_on_resize(mut self) -> Self {
        self.reload_on_resize = true;
        self
    }
}

/// A pluggable content source.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Name used in logs and host events.
    fn name(&self) -> &str;

    /// Current capability flags. Queried on every eligibility check.
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Check for displayable content.
    ///
    /// Must resolve exactly once per call. The coordinator never cancels this
    /// future; a result that arrives after the pass was superseded is ignored.
    async fn fetch_content(&self) -> FetchOutcome;

    /// Clear provider-local state. Called when the coordinator is reset.
    fn reset(&self) {}
}

/// Process-unique provider identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(u64);

impl ProviderId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered provider.
///
/// Each call to [`ProviderHandle::new`] allocates a fresh id, so two handles
/// wrapping equal providers are still distinct entries. Clones share the id.
#[derive(Clone)]
pub struct ProviderHandle {
    id: ProviderId,
    provider: Arc<dyn ContentProvider>,
}

impl ProviderHandle {
    pub fn new<P: ContentProvider + 'static>(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    pub fn from_arc(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            id: ProviderId::next(),
            provider,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn capabilities(&self) -> ProviderCapabilities {
        self.provider.capabilities()
    }

    pub fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }
}

impl PartialEq for ProviderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProviderHandle {}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

/// Provider that answers every fetch with a configurable outcome.
///
/// Useful for house ads and for hosts wiring the coordinator before real
/// providers exist.
pub struct StaticProvider {
    name: String,
    capabilities: Mutex<ProviderCapabilities>,
    outcome: Mutex<FetchOutcome>,
    fetches: AtomicUsize,
    resets: AtomicUsize,
}

impl StaticProvider {
    pub fn new(
        name: impl Into<String>,
        capabilities: ProviderCapabilities,
        outcome: FetchOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities: Mutex::new(capabilities),
            outcome: Mutex::new(outcome),
            fetches: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        }
    }

    pub fn set_outcome(&self, outcome: FetchOutcome) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    pub fn set_capabilities(&self, capabilities: ProviderCapabilities) {
        *self.capabilities.lock().unwrap_or_else(PoisonError::into_inner) = capabilities;
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        *self.capabilities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_content(&self) -> FetchOutcome {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_have_distinct_identity() {
        let same = || StaticProvider::new("same", Default::default(), FetchOutcome::Available);
        let a = ProviderHandle::new(same());
        let b = ProviderHandle::new(same());

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_default_capabilities() {
        let caps = ProviderCapabilities::default();
        assert!(!caps.requires_connectivity);
        assert!(!caps.offline_cache_available);
        assert!(caps.refresh_interval.is_zero());
        assert!(!caps.reload_on_resize);
    }

    #[test]
    fn test_capability_builders() {
        let caps = ProviderCapabilities::online()
            .with_offline_cache()
            .with_refresh_interval(Duration::from_secs(60))
            .with_reload_on_resize();

        assert!(caps.requires_connectivity);
        assert!(caps.offline_cache_available);
        assert_eq!(caps.refresh_interval, Duration::from_secs(60));
        assert!(caps.reload_on_resize);
    }

    #[tokio::test]
    async fn test_static_provider_counts_fetches() {
        let provider = StaticProvider::new("house", Default::default(), FetchOutcome::NoContent);

        assert_eq!(provider.fetch_content().await, FetchOutcome::NoContent);
        provider.set_outcome(FetchOutcome::Available);
        assert_eq!(provider.fetch_content().await, FetchOutcome::Available);
        assert_eq!(provider.fetch_count(), 2);
    }
}
