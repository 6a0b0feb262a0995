//! Concurrency policies: racing tasks under `Every`, supersession under
//! `Latest`.

use fetchflow_core::transport::Verb;
use fetchflow_core::{SliceState, TransportResponse};
use fetchflow_runtime::{AppStore, Concurrency, TaskBlueprint};
use fetchflow_testing::MockTransport;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn slow_then_fast(slow: Value, fast: Value) -> MockTransport {
    MockTransport::new()
        .reply_after(
            TransportResponse {
                status: 200,
                body: Some(slow),
            },
            Duration::from_millis(150),
        )
        .reply_after(
            TransportResponse {
                status: 200,
                body: Some(fast),
            },
            Duration::from_millis(30),
        )
}

fn compose(primary: MockTransport, concurrency: Concurrency) -> AppStore {
    AppStore::builder()
        .resource("widgets")
        .watch_with(
            "widgets",
            TaskBlueprint::new(Verb::Get, "/v1/widgets"),
            concurrency,
        )
        .build(
            Arc::new(primary),
            Arc::new(MockTransport::new()),
            Arc::new(fetchflow_core::notify::NullNotifier),
        )
        .expect("store composition failed")
}

async fn settled_state(store: &AppStore) -> SliceState {
    // Both scripted replies resolve well inside this window
    tokio::time::sleep(Duration::from_millis(400)).await;
    store
        .slice_state("widgets")
        .await
        .expect("widgets slice registered")
}

#[tokio::test]
async fn every_policy_lets_the_last_arrival_win() {
    let store = compose(
        slow_then_fast(json!({"run": "slow"}), json!({"run": "fast"})),
        Concurrency::Every,
    );
    let mut rx = store.environment().dispatcher.subscribe();

    store.request("widgets", json!({})).expect("known resource");
    store.request("widgets", json!({})).expect("known resource");

    let state = settled_state(&store).await;

    // The faster second reply landed first and was overwritten by the
    // slower one: last terminal in wall-clock order wins, not dispatch order
    assert_eq!(state.data, Some(json!({"run": "slow"})));

    let mut terminals = Vec::new();
    while let Ok(Ok(signal)) =
        tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
    {
        if signal.id == "WIDGETS_SUCCESS" {
            terminals.push(signal.payload);
        }
    }
    assert_eq!(terminals.len(), 2);
    assert_eq!(terminals.last(), Some(&json!({"run": "slow"})));
}

#[tokio::test]
async fn latest_policy_suppresses_the_superseded_task() {
    let store = compose(
        slow_then_fast(json!({"run": "slow"}), json!({"run": "fast"})),
        Concurrency::Latest,
    );
    let mut rx = store.environment().dispatcher.subscribe();

    store.request("widgets", json!({})).expect("known resource");
    store.request("widgets", json!({})).expect("known resource");

    let state = settled_state(&store).await;

    // Only the second (current) task commits its terminal signal
    assert_eq!(state.data, Some(json!({"run": "fast"})));

    let mut terminals = 0;
    while let Ok(Ok(signal)) =
        tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
    {
        if signal.id == "WIDGETS_SUCCESS" || signal.id == "WIDGETS_FAILED" {
            terminals += 1;
        }
    }
    assert_eq!(terminals, 1);
}

#[tokio::test]
async fn latest_policy_is_invisible_for_sequential_requests() {
    let store = compose(
        MockTransport::new()
            .status(200, json!({"run": 1}))
            .status(200, json!({"run": 2})),
        Concurrency::Latest,
    );

    store
        .request_and_wait("widgets", json!({}), Duration::from_secs(1))
        .await
        .expect("first terminal");
    store
        .request_and_wait("widgets", json!({}), Duration::from_secs(1))
        .await
        .expect("second terminal");

    let state = settled_state(&store).await;
    assert_eq!(state.data, Some(json!({"run": 2})));
}
