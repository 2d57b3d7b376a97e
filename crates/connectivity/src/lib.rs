//! Network reachability for billboard.
//!
//! Exposes a thread-safe "has connectivity" flag and a change notification
//! that fires only when the satisfied/unsatisfied state actually flips.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  status.rs  - PathStatus and flip-only PathState (pure)     │
//! │  source.rs  - ReachabilitySource trait + implementations    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  observer.rs - Background probing and change publication    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use billboard_connectivity::{ConnectivityConfig, ConnectivityObserver};
//!
//! let mut observer = ConnectivityObserver::tcp(&ConnectivityConfig::default());
//! let mut changes = observer.subscribe();
//! observer.start();
//!
//! while changes.changed().await.is_ok() {
//!     println!("online: {}", *changes.borrow());
//! }
//! ```

mod config;
mod observer;
mod source;
mod status;

pub use config::{
    ConnectivityConfig, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_ADDR, DEFAULT_PROBE_TIMEOUT,
};
pub use observer::{ConnectivityObserver, ConnectivitySubscription};
pub use source::{ManualSource, NullSource, ReachabilitySource, TcpProbeSource};
pub use status::{PathState, PathStatus};
