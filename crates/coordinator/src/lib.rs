//! Promotional content provider selection.
//!
//! Picks the single provider whose content should be on screen from a
//! priority-ordered list, skipping providers that need a network the device
//! lacks or that are still cooling down after their last fetch.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  provider.rs    - ContentProvider trait, ids, capabilities  │
//! │  registry.rs    - Last outcome per provider                 │
//! │  eligibility.rs - Connectivity and retry-gate rules (pure)  │
//! │  machine.rs     - Selection state machine (pure)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  service.rs  - Owner task, fetch spawning, connectivity     │
//! │  delegate.rs - Host callbacks and event bus publishing      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use billboard_coordinator::{CoordinatorConfig, CoordinatorService, NullDelegate};
//! use std::sync::Arc;
//!
//! let service = CoordinatorService::spawn(
//!     providers,
//!     &CoordinatorConfig::default(),
//!     Arc::new(NullDelegate),
//!     Some(observer.subscribe()),
//! );
//!
//! match service.select().await {
//!     Ok(provider) => println!("showing {}", provider.name()),
//!     Err(e) => println!("nothing to show: {e}"),
//! }
//! ```

mod config;
mod delegate;
mod eligibility;
mod error;
mod machine;
mod provider;
mod registry;
mod service;

pub use config::{BillboardConfig, CoordinatorConfig, DEFAULT_RETRY_INTERVAL};
pub use delegate::{
    ChannelDelegate, EventBusDelegate, NullDelegate, SelectionDelegate, SelectionDelegateRef,
    SelectionEvent,
};
pub use eligibility::{first_eligible_from, is_eligible, required_wait, should_skip};
pub use error::{ConfigError, SelectionError};
pub use machine::{CoordinatorSnapshot, Directive, Selection, SelectionMachine, SelectionState};
pub use provider::{
    ContentProvider, FetchOutcome, ProviderCapabilities, ProviderHandle, ProviderId, StaticProvider,
};
pub use registry::{OutcomeRecord, OutcomeRegistry};
pub use service::{CoordinatorHandle, CoordinatorService};

// Re-export connectivity types the service API depends on
pub use billboard_connectivity::{
    ConnectivityConfig, ConnectivityObserver, ConnectivitySubscription,
};
