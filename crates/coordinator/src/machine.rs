//! Provider selection state machine.
//!
//! Owns the ordered provider list, the outcome registry and the in-flight
//! marker. Every transition returns a [`Directive`] for the runtime to carry
//! out; the machine itself never spawns, sleeps or calls the host. This keeps
//! all transitions deterministic and lets the runtime defer work to its next
//! loop iteration.

use crate::eligibility::{first_eligible_from, is_eligible, should_skip};
use crate::provider::{FetchOutcome, ProviderHandle, ProviderId};
use crate::registry::OutcomeRegistry;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "provider", rename_all = "snake_case")]
pub enum SelectionState {
    /// No fetch in progress, nothing displayed.
    Idle,
    /// A provider's content check is outstanding.
    Fetching(ProviderId),
    /// A provider reported content and is current.
    Displaying(ProviderId),
    /// Every eligible provider was tried without content.
    Exhausted,
}

/// A committed provider.
#[derive(Debug, Clone)]
pub struct Selection {
    pub provider: ProviderHandle,
    /// Pass that produced the selection.
    pub epoch: u64,
    /// Position in the provider list.
    pub priority: usize,
    /// Committed while offline, i.e. rendered from the provider's cache.
    pub offline: bool,
}

/// Work the runtime must perform after a transition.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Re-enqueue an issue step for `provider` on the owner's next iteration.
    Issue { epoch: u64, provider: ProviderId },
    /// Start the provider's asynchronous fetch.
    Fetch { epoch: u64, provider: ProviderHandle },
    /// Pass ended with a provider; notify the host.
    Selected(Selection),
    /// Pass ended without content; notify the host.
    Exhausted { epoch: u64 },
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorSnapshot {
    pub state: SelectionState,
    pub current: Option<ProviderId>,
    pub querying: Option<ProviderId>,
    pub epoch: u64,
    pub has_connectivity: bool,
    pub provider_count: usize,
    pub recorded_outcomes: usize,
}

pub struct SelectionMachine {
    providers: Vec<ProviderHandle>,
    current: Option<ProviderHandle>,
    querying: Option<ProviderHandle>,
    is_fetching: bool,
    exhausted: bool,
    committed_offline: bool,
    /// The in-flight fetch was issued while offline and is served from cache.
    fetch_offline: bool,
    /// Connectivity came back while a pass was running.
    regained_mid_pass: bool,
    previous_fetch_time: Option<Instant>,
    outcomes: OutcomeRegistry,
    has_connectivity: bool,
    epoch: u64,
    retry_interval: Duration,
}

impl SelectionMachine {
    pub fn new(
        providers: Vec<ProviderHandle>,
        retry_interval: Duration,
        has_connectivity: bool,
    ) -> Self {
        Self {
            providers,
            current: None,
            querying: None,
            is_fetching: false,
            exhausted: false,
            committed_offline: false,
            fetch_offline: false,
            regained_mid_pass: false,
            previous_fetch_time: None,
            outcomes: OutcomeRegistry::new(),
            has_connectivity,
            epoch: 0,
            retry_interval,
        }
    }

    pub fn state(&self) -> SelectionState {
        if self.is_fetching {
            if let Some(p) = &self.querying {
                return SelectionState::Fetching(p.id());
            }
        }
        if let Some(p) = &self.current {
            return SelectionState::Displaying(p.id());
        }
        if self.exhausted {
            return SelectionState::Exhausted;
        }
        SelectionState::Idle
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current(&self) -> Option<&ProviderHandle> {
        self.current.as_ref()
    }

    pub fn querying(&self) -> Option<&ProviderHandle> {
        self.querying.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn has_connectivity(&self) -> bool {
        self.has_connectivity
    }

    pub fn providers(&self) -> &[ProviderHandle] {
        &self.providers
    }

    pub fn outcomes(&self) -> &OutcomeRegistry {
        &self.outcomes
    }

    pub fn previous_fetch_time(&self) -> Option<Instant> {
        self.previous_fetch_time
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            state: self.state(),
            current: self.current.as_ref().map(ProviderHandle::id),
            querying: self.querying.as_ref().map(ProviderHandle::id),
            epoch: self.epoch,
            has_connectivity: self.has_connectivity,
            provider_count: self.providers.len(),
            recorded_outcomes: self.outcomes.len(),
        }
    }

    /// Start a fresh pass from the top of the list, superseding any pass in
    /// progress.
    pub fn fetch_best_provider(&mut self) -> Directive {
        self.epoch += 1;
        self.is_fetching = false;
        self.querying = None;
        self.exhausted = false;
        self.regained_mid_pass = false;

        tracing::debug!(
            epoch = self.epoch,
            providers = self.providers.len(),
            "selection pass started"
        );

        match first_eligible_from(&self.providers, 0, self.has_connectivity) {
            Some(index) => self.begin_query(index),
            None => self.exhaust(),
        }
    }

    /// Apply the retry gate to the in-flight candidate and either fetch it or
    /// move on. Stale steps return `None`.
    pub fn issue(&mut self, epoch: u64, provider: ProviderId, now: Instant) -> Option<Directive> {
        if !self.is_in_flight(epoch, provider) {
            tracing::debug!(epoch, %provider, "ignoring stale issue step");
            return None;
        }
        let handle = self.querying.clone()?;
        let caps = handle.capabilities();

        if !is_eligible(&caps, self.has_connectivity) {
            tracing::debug!(
                provider = handle.name(),
                epoch,
                "provider no longer eligible"
            );
            return Some(self.advance_past(provider));
        }

        if should_skip(
            &caps,
            self.outcomes.record_for(provider),
            self.retry_interval,
            self.previous_fetch_time,
            now,
        ) {
            tracing::debug!(
                provider = handle.name(),
                epoch,
                last = ?self.outcomes.outcome_for(provider),
                "retry interval not elapsed, skipping"
            );
            return Some(self.advance_past(provider));
        }

        self.previous_fetch_time = Some(now);
        self.fetch_offline = caps.requires_connectivity && !self.has_connectivity;
        tracing::debug!(
            provider = handle.name(),
            epoch,
            offline = self.fetch_offline,
            "fetching provider content"
        );
        Some(Directive::Fetch { epoch, provider: handle })
    }

    /// Apply a fetch result. Results from superseded or cancelled passes are
    /// ignored and return `None`.
    pub fn complete(
        &mut self,
        epoch: u64,
        provider: ProviderId,
        outcome: FetchOutcome,
        now: Instant,
    ) -> Option<Directive> {
        if !self.is_in_flight(epoch, provider) {
            tracing::debug!(epoch, %provider, %outcome, "ignoring stale fetch result");
            return None;
        }

        self.outcomes.record(provider, outcome, now);
        self.is_fetching = false;
        let handle = self.querying.take()?;

        if !outcome.is_available() {
            tracing::debug!(
                provider = handle.name(),
                epoch,
                %outcome,
                "provider has nothing to show"
            );
            return Some(self.advance_past(provider));
        }

        let offline = self.fetch_offline;
        let priority = self.position(provider).unwrap_or_default();
        self.committed_offline = offline;
        self.current = Some(handle.clone());

        tracing::info!(
            provider = handle.name(),
            epoch,
            priority,
            offline,
            "provider selected"
        );
        Some(Directive::Selected(Selection {
            provider: handle,
            epoch,
            priority,
            offline,
        }))
    }

    /// Stop the current pass and forget what is displayed. Recorded outcomes
    /// survive; the cancellation time counts as the last fetch attempt.
    pub fn cancel_fetch(&mut self, now: Instant) {
        if self.is_fetching {
            self.epoch += 1;
        }
        self.clear_selection();
        self.regained_mid_pass = false;
        self.previous_fetch_time = Some(now);
        tracing::debug!(epoch = self.epoch, "selection cancelled");
    }

    /// Forget everything, including recorded outcomes and fetch timing.
    pub fn reset(&mut self) {
        if self.is_fetching {
            self.epoch += 1;
        }
        self.clear_selection();
        self.regained_mid_pass = false;
        self.outcomes.clear();
        self.previous_fetch_time = None;
        tracing::debug!(epoch = self.epoch, "coordinator reset");
    }

    /// Replace the provider list. Forces a full reset.
    pub fn set_providers(&mut self, providers: Vec<ProviderHandle>) {
        self.providers = providers;
        self.reset();
    }

    /// Remove a provider permanently. Returns a new pass when the removed
    /// provider was being fetched, or was displayed with no pass running.
    pub fn deregister_provider(&mut self, provider: ProviderId) -> Option<Directive> {
        let index = self.position(provider)?;
        let removed = self.providers.remove(index);
        self.outcomes.remove(provider);
        tracing::debug!(provider = removed.name(), "provider deregistered");

        if self.is_fetching && self.querying.as_ref().is_some_and(|p| p.id() == provider) {
            return Some(self.fetch_best_provider());
        }

        if self.current.as_ref().is_some_and(|p| p.id() == provider) {
            self.current = None;
            self.committed_offline = false;
            if !self.is_fetching {
                return Some(self.fetch_best_provider());
            }
        }

        None
    }

    /// Record a connectivity flip. Regaining the network re-runs selection
    /// when the displayed provider was committed offline from its cache, or
    /// when the last pass was exhausted.
    ///
    /// A regain during a running pass is held until the pass settles; see
    /// [`SelectionMachine::take_deferred_reevaluation`].
    pub fn connectivity_changed(&mut self, has_connectivity: bool) -> Option<Directive> {
        let regained = has_connectivity && !self.has_connectivity;
        self.has_connectivity = has_connectivity;

        if !has_connectivity {
            self.regained_mid_pass = false;
            return None;
        }
        if !regained {
            return None;
        }
        if self.is_fetching {
            tracing::debug!(
                epoch = self.epoch,
                "connectivity regained mid-pass, deferring"
            );
            self.regained_mid_pass = true;
            return None;
        }

        self.reevaluate()
    }

    /// Re-evaluation owed for a connectivity regain that arrived while the
    /// previous pass was running. Returns `None` while a pass is still in
    /// flight or when nothing is owed.
    pub fn take_deferred_reevaluation(&mut self) -> Option<Directive> {
        if self.is_fetching || !self.regained_mid_pass {
            return None;
        }
        self.regained_mid_pass = false;
        self.reevaluate()
    }

    fn reevaluate(&mut self) -> Option<Directive> {
        if let Some(current) = &self.current {
            if current.capabilities().requires_connectivity && self.committed_offline {
                tracing::info!(
                    provider = current.name(),
                    "connectivity regained, re-evaluating"
                );
                return Some(self.fetch_best_provider());
            }
            return None;
        }

        if self.exhausted {
            tracing::info!("connectivity regained after exhaustion, re-evaluating");
            return Some(self.fetch_best_provider());
        }

        None
    }

    /// Host container changed size.
    pub fn container_resized(&mut self) -> Option<Directive> {
        if self.is_fetching {
            return None;
        }
        let current = self.current.as_ref()?;
        if !current.capabilities().reload_on_resize {
            return None;
        }
        tracing::debug!(provider = current.name(), "reloading after resize");
        Some(self.fetch_best_provider())
    }

    fn is_in_flight(&self, epoch: u64, provider: ProviderId) -> bool {
        epoch == self.epoch
            && self.is_fetching
            && self.querying.as_ref().is_some_and(|p| p.id() == provider)
    }

    fn position(&self, provider: ProviderId) -> Option<usize> {
        self.providers.iter().position(|p| p.id() == provider)
    }

    fn begin_query(&mut self, index: usize) -> Directive {
        let handle = self.providers[index].clone();
        let provider = handle.id();
        self.querying = Some(handle);
        self.is_fetching = true;
        Directive::Issue {
            epoch: self.epoch,
            provider,
        }
    }

    fn advance_past(&mut self, provider: ProviderId) -> Directive {
        let start = self
            .position(provider)
            .map_or(self.providers.len(), |index| index + 1);
        match first_eligible_from(&self.providers, start, self.has_connectivity) {
            Some(index) => self.begin_query(index),
            None => self.exhaust(),
        }
    }

    fn exhaust(&mut self) -> Directive {
        self.clear_selection();
        self.exhausted = true;
        tracing::info!(epoch = self.epoch, "no provider has content");
        Directive::Exhausted { epoch: self.epoch }
    }

    fn clear_selection(&mut self) {
        self.is_fetching = false;
        self.fetch_offline = false;
        self.querying = None;
        self.current = None;
        self.committed_offline = false;
        self.exhausted = false;
    }
}
