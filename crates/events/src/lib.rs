//! Event contracts between the billboard coordinator and its host.
//!
//! The DTOs here are what the host sees when a selection pass ends or when
//! connectivity flips. Using shared types keeps field names consistent between
//! the publisher and whatever forwards the events to the UI layer.
//!
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Emitted when a selection pass commits a provider.
///
/// Producers: coordinator
/// Consumers: host view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelectedEvent {
    /// Stable id of the committed provider.
    pub provider_id: u64,
    /// Human-readable provider name.
    pub provider_name: String,
    /// Position of the provider in the priority list.
    #[serde(default)]
    pub priority: Option<usize>,
    /// Whether the provider was committed while the device was offline.
    #[serde(default)]
    pub offline: bool,
    /// Selection pass that produced this result.
    pub epoch: u64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Emitted when a selection pass exhausts every eligible provider.
///
/// Producers: coordinator
/// Consumers: host view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFailedEvent {
    pub epoch: u64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Emitted when the connectivity observer sees the satisfied flag flip.
///
/// Producers: coordinator, on each observer flip
/// Consumers: host view, diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityChangedEvent {
    pub has_connectivity: bool,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// A provider was committed as current.
    pub const PROVIDER_SELECTED: &str = "selection:provider_selected";
    /// A selection pass ended without content.
    pub const SELECTION_FAILED: &str = "selection:failed";
    /// Connectivity flipped.
    pub const CONNECTIVITY_CHANGED: &str = "connectivity:changed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selected_deserialize_minimal() {
        let json = r#"{"provider_id": 7, "provider_name": "announcements", "epoch": 2}"#;
        let event: ProviderSelectedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.provider_id, 7);
        assert_eq!(event.provider_name, "announcements");
        assert_eq!(event.priority, None);
        assert!(!event.offline);
        assert_eq!(event.timestamp_ms, 0);
    }

    #[test]
    fn test_connectivity_changed_roundtrip_fields() {
        let event = ConnectivityChangedEvent {
            has_connectivity: true,
            timestamp_ms: 42,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["has_connectivity"], true);
        assert_eq!(value["timestamp_ms"], 42);
    }

    #[test]
    fn test_now_ms_is_positive() {
        assert!(now_ms() > 0);
    }
}
