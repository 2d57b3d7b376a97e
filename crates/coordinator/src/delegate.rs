//! Host callbacks.
//!
//! The coordinator reports each pass's terminal result through a
//! [`SelectionDelegate`], at most once per pass, from the coordinator task.

use crate::machine::Selection;
use billboard_events::{
    emit_event, event_names, now_ms, ConnectivityChangedEvent, EventBusRef, ProviderSelectedEvent,
    SelectionFailedEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives the terminal result of every selection pass.
pub trait SelectionDelegate: Send + Sync {
    /// A provider was committed as current.
    fn on_provider_selected(&self, selection: &Selection);

    /// Every eligible provider was tried without content.
    fn on_selection_failed(&self, epoch: u64);

    /// The connectivity observer reported a flip.
    fn on_connectivity_changed(&self, _has_connectivity: bool) {}
}

/// Type alias for shared delegate reference.
pub type SelectionDelegateRef = Arc<dyn SelectionDelegate>;

/// Delegate that ignores every result.
pub struct NullDelegate;

impl SelectionDelegate for NullDelegate {
    fn on_provider_selected(&self, _selection: &Selection) {}

    fn on_selection_failed(&self, _epoch: u64) {}
}

/// Publishes results on an [`billboard_events::EventBus`].
pub struct EventBusDelegate {
    bus: EventBusRef,
}

impl EventBusDelegate {
    pub fn new(bus: EventBusRef) -> Self {
        Self { bus }
    }
}

impl SelectionDelegate for EventBusDelegate {
    fn on_provider_selected(&self, selection: &Selection) {
        let event = ProviderSelectedEvent {
            provider_id: selection.provider.id().get(),
            provider_name: selection.provider.name().to_string(),
            priority: Some(selection.priority),
            offline: selection.offline,
            epoch: selection.epoch,
            timestamp_ms: now_ms(),
        };
        emit_event(self.bus.as_ref(), event_names::PROVIDER_SELECTED, &event);
    }

    fn on_selection_failed(&self, epoch: u64) {
        let event = SelectionFailedEvent {
            epoch,
            timestamp_ms: now_ms(),
        };
        emit_event(self.bus.as_ref(), event_names::SELECTION_FAILED, &event);
    }

    fn on_connectivity_changed(&self, has_connectivity: bool) {
        let event = ConnectivityChangedEvent {
            has_connectivity,
            timestamp_ms: now_ms(),
        };
        emit_event(self.bus.as_ref(), event_names::CONNECTIVITY_CHANGED, &event);
    }
}

/// A selection result forwarded by [`ChannelDelegate`].
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    Selected(Selection),
    Failed { epoch: u64 },
}

/// Forwards results into an unbounded channel for hosts running their own loop.
pub struct ChannelDelegate {
    tx: mpsc::UnboundedSender<SelectionEvent>,
}

impl ChannelDelegate {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SelectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SelectionDelegate for ChannelDelegate {
    fn on_provider_selected(&self, selection: &Selection) {
        if self.tx.send(SelectionEvent::Selected(selection.clone())).is_err() {
            tracing::debug!("selection receiver dropped");
        }
    }

    fn on_selection_failed(&self, epoch: u64) {
        if self.tx.send(SelectionEvent::Failed { epoch }).is_err() {
            tracing::debug!("selection receiver dropped");
        }
    }
}
