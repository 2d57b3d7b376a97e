//! Eligibility and retry-gate rules.
//!
//! Pure domain logic - no I/O, no clocks. Callers pass `now` explicitly.

use crate::provider::{FetchOutcome, ProviderCapabilities, ProviderHandle};
use crate::registry::OutcomeRecord;
use std::time::{Duration, Instant};

/// Whether a provider may be attempted given current connectivity.
///
/// Providers that do not need the network are always eligible. Networked
/// providers need connectivity or an offline cache.
pub fn is_eligible(caps: &ProviderCapabilities, has_connectivity: bool) -> bool {
    !caps.requires_connectivity || has_connectivity || caps.offline_cache_available
}

/// Cooldown owed by a provider before it may be fetched again.
///
/// Only networked providers with a recorded outcome owe anything: the
/// coordinator retry interval after `Failed`, the provider's own refresh
/// interval after `NoContent` or `Available`.
pub fn required_wait(
    caps: &ProviderCapabilities,
    last: Option<&OutcomeRecord>,
    retry_interval: Duration,
) -> Duration {
    if !caps.requires_connectivity {
        return Duration::ZERO;
    }
    match last.map(|r| r.outcome) {
        Some(FetchOutcome::Failed) => retry_interval,
        Some(FetchOutcome::NoContent | FetchOutcome::Available) => caps.refresh_interval,
        None => Duration::ZERO,
    }
}

/// Retry gate: skip when less than the owed wait has elapsed since the last
/// fetch attempt. `previous_fetch` is tracked coordinator-wide.
pub fn should_skip(
    caps: &ProviderCapabilities,
    last: Option<&OutcomeRecord>,
    retry_interval: Duration,
    previous_fetch: Option<Instant>,
    now: Instant,
) -> bool {
    let wait = required_wait(caps, last, retry_interval);
    if wait.is_zero() {
        return false;
    }
    match previous_fetch {
        Some(previous) => now.saturating_duration_since(previous) < wait,
        None => false,
    }
}

/// Index of the first eligible provider at or after `start`.
pub fn first_eligible_from(
    providers: &[ProviderHandle],
    start: usize,
    has_connectivity: bool,
) -> Option<usize> {
    providers
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, p)| is_eligible(&p.capabilities(), has_connectivity))
        .map(|(index, _)| index)
}
