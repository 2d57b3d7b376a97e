//! Per-provider record of the last fetch outcome.

use crate::provider::{FetchOutcome, ProviderId};
use std::collections::HashMap;
use std::time::Instant;

/// Last recorded outcome for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub outcome: FetchOutcome,
    /// Monotonic time the outcome was recorded.
    pub recorded_at: Instant,
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// Outcome cache keyed by provider id.
///
/// Entries live until [`OutcomeRegistry::remove`] (provider deregistered) or
/// [`OutcomeRegistry::clear`] (coordinator reset).
#[derive(Debug, Default)]
pub struct OutcomeRegistry {
    records: HashMap<ProviderId, OutcomeRecord>,
}

impl OutcomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest outcome, replacing any previous record.
    pub fn record(&mut self, provider: ProviderId, outcome: FetchOutcome, at: Instant) {
        self.records.insert(
            provider,
            OutcomeRecord {
                outcome,
                recorded_at: at,
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            },
        );
    }

    pub fn outcome_for(&self, provider: ProviderId) -> Option<FetchOutcome> {
        self.records.get(&provider).map(|r| r.outcome)
    }

    pub fn record_for(&self, provider: ProviderId) -> Option<&OutcomeRecord> {
        self.records.get(&provider)
    }

    pub fn remove(&mut self, provider: ProviderId) -> Option<OutcomeRecord> {
        self.records.remove(&provider)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
