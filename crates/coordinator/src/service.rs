//! Coordinator runtime - owner task that drives the selection machine.
//!
//! All state transitions happen on one spawned task. Host calls, fetch
//! results and deferred issue steps all arrive as messages on one queue, so
//! an issue step re-enqueued by the machine runs on the next loop iteration
//! rather than on the caller's stack.

use crate::config::CoordinatorConfig;
use crate::delegate::SelectionDelegateRef;
use crate::error::SelectionError;
use crate::machine::{CoordinatorSnapshot, Directive, SelectionMachine};
use crate::provider::{FetchOutcome, ProviderHandle, ProviderId};
use billboard_connectivity::ConnectivitySubscription;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type SelectReply = oneshot::Sender<Result<ProviderHandle, SelectionError>>;

enum Command {
    FetchBest { reply: Option<SelectReply> },
    Cancel,
    Reset,
    SetProviders(Vec<ProviderHandle>),
    Deregister(ProviderId),
    Resized,
    Snapshot(oneshot::Sender<CoordinatorSnapshot>),
    Issue { epoch: u64, provider: ProviderId },
    Completed { epoch: u64, provider: ProviderId, outcome: FetchOutcome },
    Shutdown,
}

/// Cloneable handle for talking to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    fn send(&self, command: Command) -> Result<(), SelectionError> {
        self.tx.send(command).map_err(|_| SelectionError::ServiceStopped)
    }

    /// Start a fresh selection pass. The result goes to the delegate.
    pub fn fetch_best_provider(&self) -> Result<(), SelectionError> {
        self.send(Command::FetchBest { reply: None })
    }

    /// Alias for [`CoordinatorHandle::fetch_best_provider`].
    pub fn reload(&self) -> Result<(), SelectionError> {
        self.fetch_best_provider()
    }

    /// Start a fresh pass and wait for its result.
    ///
    /// The delegate is notified as well. Resolves to `Superseded` if a later
    /// command replaces the pass.
    pub async fn select(&self) -> Result<ProviderHandle, SelectionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::FetchBest { reply: Some(reply) })?;
        rx.await.unwrap_or(Err(SelectionError::ServiceStopped))
    }

    /// Stop the running pass. Recorded outcomes are kept.
    pub fn cancel_fetch(&self) -> Result<(), SelectionError> {
        self.send(Command::Cancel)
    }

    /// Forget all outcomes and timing and reset every provider.
    pub fn reset(&self) -> Result<(), SelectionError> {
        self.send(Command::Reset)
    }

    /// Replace the provider list. Implies [`CoordinatorHandle::reset`].
    pub fn set_providers(&self, providers: Vec<ProviderHandle>) -> Result<(), SelectionError> {
        self.send(Command::SetProviders(providers))
    }

    /// Remove a provider permanently, dropping its recorded outcome.
    pub fn deregister_provider(&self, provider: ProviderId) -> Result<(), SelectionError> {
        self.send(Command::Deregister(provider))
    }

    /// Notify that the host container changed size.
    pub fn container_resized(&self) -> Result<(), SelectionError> {
        self.send(Command::Resized)
    }

    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, SelectionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| SelectionError::ServiceStopped)
    }
}

/// Owns the coordinator task.
///
/// Dropping the service stops the task; outstanding provider fetches keep
/// running but their results are discarded.
pub struct CoordinatorService {
    handle: CoordinatorHandle,
    task: Option<JoinHandle<()>>,
}

impl CoordinatorService {
    /// Spawn the coordinator on the current tokio runtime.
    ///
    /// Without a connectivity subscription the coordinator assumes the device
    /// is online.
    pub fn spawn(
        providers: Vec<ProviderHandle>,
        config: &CoordinatorConfig,
        delegate: SelectionDelegateRef,
        mut connectivity: Option<ConnectivitySubscription>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let online = connectivity
            .as_mut()
            .map_or(true, |subscription| *subscription.borrow_and_update());

        let actor = Actor {
            machine: SelectionMachine::new(providers, config.retry_interval(), online),
            delegate,
            tx: tx.clone(),
            waiters: Vec::new(),
        };
        let task = tokio::spawn(actor.run(rx, connectivity));

        Self {
            handle: CoordinatorHandle { tx },
            task: Some(task),
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.handle.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl std::ops::Deref for CoordinatorService {
    type Target = CoordinatorHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for CoordinatorService {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.handle.send(Command::Shutdown);
        }
    }
}

struct Actor {
    machine: SelectionMachine,
    delegate: SelectionDelegateRef,
    tx: mpsc::UnboundedSender<Command>,
    waiters: Vec<(u64, SelectReply)>,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn next_flip(connectivity: &mut Option<ConnectivitySubscription>) -> Option<bool> {
    match connectivity {
        Some(subscription) => match subscription.changed().await {
            Ok(()) => Some(*subscription.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

impl Actor {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        mut connectivity: Option<ConnectivitySubscription>,
    ) {
        tracing::info!(
            providers = self.machine.providers().len(),
            online = self.machine.has_connectivity(),
            "coordinator started"
        );

        loop {
            // Connectivity first so a flip is applied before commands queued after it.
            tokio::select! {
                biased;
                flip = next_flip(&mut connectivity) => match flip {
                    Some(online) => {
                        tracing::debug!(online, "connectivity update");
                        self.delegate.on_connectivity_changed(online);
                        let directive = self.machine.connectivity_changed(online);
                        self.apply(directive);
                    }
                    None => {
                        tracing::debug!("connectivity observer dropped");
                        connectivity = None;
                    }
                },
                command = rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
            }
        }

        tracing::info!("coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::FetchBest { reply } => {
                let directive = self.machine.fetch_best_provider();
                if let Some(reply) = reply {
                    self.waiters.push((self.machine.epoch(), reply));
                }
                self.apply(Some(directive));
            }
            Command::Cancel => self.machine.cancel_fetch(now()),
            Command::Reset => {
                self.machine.reset();
                for provider in self.machine.providers() {
                    provider.provider().reset();
                }
            }
            Command::SetProviders(providers) => self.machine.set_providers(providers),
            Command::Deregister(provider) => {
                let directive = self.machine.deregister_provider(provider);
                self.apply(directive);
            }
            Command::Resized => {
                let directive = self.machine.container_resized();
                self.apply(directive);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot());
            }
            Command::Issue { epoch, provider } => {
                let directive = self.machine.issue(epoch, provider, now());
                self.apply(directive);
            }
            Command::Completed {
                epoch,
                provider,
                outcome,
            } => {
                let directive = self.machine.complete(epoch, provider, outcome, now());
                self.apply(directive);
            }
            Command::Shutdown => {}
        }
        self.release_superseded();
    }

    fn apply(&mut self, directive: Option<Directive>) {
        let Some(directive) = directive else {
            return;
        };

        match directive {
            Directive::Issue { epoch, provider } => {
                let _ = self.tx.send(Command::Issue { epoch, provider });
            }
            Directive::Fetch { epoch, provider } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = provider.provider().fetch_content().await;
                    let _ = tx.send(Command::Completed {
                        epoch,
                        provider: provider.id(),
                        outcome,
                    });
                });
            }
            Directive::Selected(selection) => {
                self.delegate.on_provider_selected(&selection);
                self.resolve(selection.epoch, Ok(selection.provider));
                self.settle();
            }
            Directive::Exhausted { epoch } => {
                self.delegate.on_selection_failed(epoch);
                self.resolve(epoch, Err(SelectionError::Exhausted));
                self.settle();
            }
        }
        self.release_superseded();
    }

    /// Run a re-evaluation held back while the finished pass was in flight.
    fn settle(&mut self) {
        let deferred = self.machine.take_deferred_reevaluation();
        self.apply(deferred);
    }

    fn resolve(&mut self, epoch: u64, result: Result<ProviderHandle, SelectionError>) {
        let (finished, pending): (Vec<_>, Vec<_>) =
            self.waiters.drain(..).partition(|(waiting, _)| *waiting == epoch);
        self.waiters = pending;
        for (_, reply) in finished {
            let _ = reply.send(result.clone());
        }
    }

    /// Fail waiters whose pass can no longer finish.
    fn release_superseded(&mut self) {
        let epoch = self.machine.epoch();
        let fetching = self.machine.is_fetching();
        let (stale, live): (Vec<_>, Vec<_>) = self
            .waiters
            .drain(..)
            .partition(|(waiting, _)| *waiting < epoch || !fetching);
        self.waiters = live;
        for (_, reply) in stale {
            let _ = reply.send(Err(SelectionError::Superseded));
        }
    }
}
