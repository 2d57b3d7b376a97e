//! Example: Rotate between a networked provider and a local house ad.
//!
//! Run with: cargo run -p billboard-coordinator --example rotate_providers [config.json]

use billboard_coordinator::{
    BillboardConfig, ChannelDelegate, ConnectivityObserver, CoordinatorService, FetchOutcome,
    ProviderCapabilities, ProviderHandle, SelectionEvent, StaticProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,billboard=debug")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match BillboardConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                return;
            }
        },
        None => BillboardConfig::default(),
    };

    println!("=== Provider Rotation Example ===");
    let probe_addr = &config.connectivity.probe_addr;
    println!("Probing {probe_addr} for connectivity.");
    println!("Disconnect the network to watch the house ad take over.\n");

    let announcements = ProviderHandle::new(StaticProvider::new(
        "announcements",
        ProviderCapabilities::online()
            .with_offline_cache()
            .with_refresh_interval(Duration::from_secs(10)),
        FetchOutcome::Available,
    ));
    let rating_prompt = ProviderHandle::new(StaticProvider::new(
        "rating-prompt",
        ProviderCapabilities::online(),
        FetchOutcome::NoContent,
    ));
    let house_ad = ProviderHandle::new(StaticProvider::new(
        "house-ad",
        ProviderCapabilities::default(),
        FetchOutcome::Available,
    ));

    let mut observer = ConnectivityObserver::tcp(&config.connectivity);
    let (delegate, mut events) = ChannelDelegate::new();
    let service = CoordinatorService::spawn(
        vec![announcements, rating_prompt, house_ad],
        &config.coordinator,
        Arc::new(delegate),
        Some(observer.subscribe()),
    );
    observer.start();

    let mut reload = tokio::time::interval(Duration::from_secs(5));
    let deadline = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(deadline);

    println!("Running for 30 seconds... (Ctrl+C to stop)\n");
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = reload.tick() => {
                if service.reload().is_err() {
                    break;
                }
            }
            Some(event) = events.recv() => match event {
                SelectionEvent::Selected(selection) => println!(
                    "[{}] Showing {:14} | priority {} | offline: {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    selection.provider.name(),
                    selection.priority,
                    if selection.offline { "yes" } else { "no" }
                ),
                SelectionEvent::Failed { epoch } => println!(
                    "[{}] Nothing to show (pass {})",
                    chrono::Local::now().format("%H:%M:%S"),
                    epoch
                ),
            },
        }
    }

    observer.cancel();
    service.shutdown().await;
    println!("\nDone.");
}
