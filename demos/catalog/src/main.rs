//! Catalog demo: two resources driven through their full lifecycle.
//!
//! Wires a store with a "widgets" resource (fetched through a scripted
//! transport) and a "session" resource (seeded locally and persisted),
//! then walks them through request, failure, reset, and restart.

use fetchflow_core::notify::{Notifier, Severity};
use fetchflow_core::transport::Verb;
use fetchflow_runtime::{AppStore, JsonFileStorage, TaskBlueprint, TaskOptions};
use fetchflow_testing::MockTransport;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints notifications the way a toast layer would render them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        println!("  [toast/{severity}] {message}");
    }
}

fn scripted_backend() -> MockTransport {
    MockTransport::new()
        .status(200, json!({"items": ["anvil", "flywheel", "gasket"]}))
        .status(
            500,
            json!({"status": false, "message": "widgets are on fire"}),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog=debug,fetchflow_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting catalog demo");
    println!("=== Catalog Demo ===\n");

    let store = AppStore::builder()
        .resource("widgets")
        .resource("session")
        .watch(
            "widgets",
            TaskBlueprint::new(Verb::Get, "/v1/widgets")
                .options(TaskOptions::default().with_notify()),
        )
        .persist_resource("session")
        .build(
            Arc::new(scripted_backend()),
            Arc::new(MockTransport::new()),
            Arc::new(ConsoleNotifier),
        )?;

    // First fetch succeeds
    println!("Fetching widgets...");
    let terminal = store
        .request_and_wait("widgets", json!({"page": 1}), Duration::from_secs(2))
        .await?;
    println!("  terminal signal: {}", terminal.id);

    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(state) = store.slice_state("widgets").await {
        println!("  widgets slice: {state:?}\n");
    }

    // Second fetch hits the scripted failure
    println!("Fetching widgets again (backend fails)...");
    let terminal = store
        .request_and_wait("widgets", json!({"page": 2}), Duration::from_secs(2))
        .await?;
    println!("  terminal signal: {}", terminal.id);

    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(state) = store.slice_state("widgets").await {
        println!("  loading={} error={:?}\n", state.loading, state.error);
    }

    // Clear the failed slice
    println!("Resetting widgets...");
    store.reset("widgets")?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(state) = store.slice_state("widgets").await {
        println!("  widgets slice: {state:?}\n");
    }

    // Seed the session locally and persist it
    println!("Seeding and persisting the session...");
    store.seed("session", json!({"user": "ada", "token": "t-123"}))?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let storage = JsonFileStorage::new(std::env::temp_dir().join("catalog-session.json"));
    store.persist(&storage).await?;
    store.shutdown();

    // A fresh store picks the session back up
    let restarted = AppStore::builder()
        .resource("widgets")
        .resource("session")
        .persist_resource("session")
        .build(
            Arc::new(MockTransport::new()),
            Arc::new(MockTransport::new()),
            Arc::new(ConsoleNotifier),
        )?;
    restarted.restore(&storage).await?;

    if let Some(state) = restarted.slice_state("session").await {
        println!("  restored session: {:?}", state.data);
    }
    if let Some(state) = restarted.slice_state("widgets").await {
        println!("  widgets start over: {:?}", state.data);
    }
    restarted.shutdown();

    println!("\n=== Demo Complete ===");
    Ok(())
}
