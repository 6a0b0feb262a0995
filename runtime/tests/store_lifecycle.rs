//! End-to-end lifecycles through a composed store.

use fetchflow_core::transport::{TransportError, Verb};
use fetchflow_core::{Severity, SliceState};
use fetchflow_runtime::{AppStore, TaskBlueprint, TaskOptions};
use fetchflow_testing::{MockTransport, RecordingNotifier};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn compose(
    primary: MockTransport,
    options: TaskOptions,
) -> (AppStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = AppStore::builder()
        .resource("widgets")
        .watch(
            "widgets",
            TaskBlueprint::new(Verb::Get, "/v1/widgets").options(options),
        )
        .build(
            Arc::new(primary),
            Arc::new(MockTransport::new()),
            Arc::clone(&notifier) as Arc<dyn fetchflow_core::Notifier>,
        )
        .expect("store composition failed");
    (store, notifier)
}

/// Poll until the slice satisfies the predicate; the driver applies signals
/// asynchronously, so tests wait for the tree rather than the stream.
async fn wait_for_state<F>(store: &AppStore, resource: &str, predicate: F) -> SliceState
where
    F: Fn(&SliceState) -> bool,
{
    for _ in 0..200 {
        if let Some(state) = store.slice_state(resource).await {
            if predicate(&state) {
                return state;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("slice never reached the expected state");
}

#[tokio::test]
async fn successful_fetch_lands_in_the_slice() {
    let (store, notifier) = compose(
        MockTransport::new().status(200, json!({"items": [1, 2, 3]})),
        TaskOptions::default(),
    );

    let mut rx = store.environment().dispatcher.subscribe();

    let terminal = store
        .request_and_wait("widgets", json!({}), Duration::from_secs(1))
        .await
        .expect("no terminal signal");
    assert_eq!(terminal.id, "WIDGETS_SUCCESS");
    assert_eq!(terminal.payload, json!({"items": [1, 2, 3]}));

    let state = wait_for_state(&store, "widgets", |s| s.data.is_some()).await;
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!({"items": [1, 2, 3]})));
    assert!(state.error.is_none());
    assert!(notifier.is_empty());

    // Exactly one terminal emission: request, then success, then silence
    let mut terminals = 0;
    while let Ok(Ok(signal)) =
        tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
    {
        if signal.id == "WIDGETS_SUCCESS" || signal.id == "WIDGETS_FAILED" {
            terminals += 1;
        }
    }
    assert_eq!(terminals, 1);
}

#[tokio::test]
async fn failure_status_mirrors_the_body_and_notifies() {
    let body = json!({"status": false, "message": "bad"});
    let (store, notifier) = compose(
        MockTransport::new().status(500, body.clone()),
        TaskOptions::default().with_notify(),
    );

    let terminal = store
        .request_and_wait("widgets", json!({}), Duration::from_secs(1))
        .await
        .expect("no terminal signal");
    assert_eq!(terminal.id, "WIDGETS_FAILED");
    assert_eq!(terminal.payload, body);

    let state = wait_for_state(&store, "widgets", SliceState::is_failed).await;
    assert!(!state.loading);
    assert_eq!(state.data, Some(body.clone()));
    assert_eq!(state.error, Some(body));

    assert_eq!(
        notifier.events(),
        vec![("bad".to_string(), Severity::Error)]
    );
}

#[tokio::test]
async fn network_error_without_message_fails_silently() {
    let (store, notifier) = compose(
        MockTransport::new().fail(TransportError::Decode("stray html".to_string())),
        TaskOptions::default(),
    );

    let terminal = store
        .request_and_wait("widgets", json!({}), Duration::from_secs(1))
        .await
        .expect("no terminal signal");
    assert_eq!(terminal.id, "WIDGETS_FAILED");
    assert_eq!(terminal.payload, json!({"reason": "stray html"}));

    let state = wait_for_state(&store, "widgets", SliceState::is_failed).await;
    assert_eq!(state.data, state.error);
    // Decode failures carry no recoverable message, so nothing is surfaced
    assert!(notifier.is_empty());
}

#[tokio::test]
async fn loading_is_set_between_request_and_terminal() {
    let (store, _) = compose(
        MockTransport::new().reply_after(
            fetchflow_core::TransportResponse {
                status: 200,
                body: Some(json!([])),
            },
            Duration::from_millis(100),
        ),
        TaskOptions::default(),
    );

    store.request("widgets", json!({})).expect("known resource");

    let state = wait_for_state(&store, "widgets", |s| s.loading).await;
    assert!(state.error.is_none());

    let state = wait_for_state(&store, "widgets", |s| !s.loading).await;
    assert_eq!(state.data, Some(json!([])));
}

#[tokio::test]
async fn reset_and_seed_drive_the_slice_without_a_call() {
    let (store, _) = compose(MockTransport::new(), TaskOptions::default());

    store
        .seed("widgets", json!({"cached": true}))
        .expect("known resource");
    let state = wait_for_state(&store, "widgets", |s| s.data.is_some()).await;
    assert_eq!(state.data, Some(json!({"cached": true})));

    store.reset("widgets").expect("known resource");
    let state = wait_for_state(&store, "widgets", |s| s.data == Some(json!([]))).await;
    assert!(!state.loading);
    assert!(state.error.is_none());
    // Cleared, not back to never-fetched
    assert_ne!(state, SliceState::initial());
}

#[tokio::test]
async fn unknown_resources_are_rejected() {
    let (store, _) = compose(MockTransport::new(), TaskOptions::default());
    assert!(store.request("gadgets", json!({})).is_err());
    assert!(store.reset("gadgets").is_err());
    assert!(store.seed("gadgets", json!({})).is_err());
}

#[tokio::test]
async fn duplicate_resources_fail_composition() {
    let result = AppStore::builder()
        .resource("widgets")
        .resource("Widgets")
        .build(
            Arc::new(MockTransport::new()),
            Arc::new(MockTransport::new()),
            Arc::new(fetchflow_core::notify::NullNotifier),
        );
    assert!(result.is_err());
}

#[tokio::test]
async fn watching_an_unregistered_resource_fails_composition() {
    let result = AppStore::builder()
        .resource("widgets")
        .watch("gadgets", TaskBlueprint::new(Verb::Get, "/v1/gadgets"))
        .build(
            Arc::new(MockTransport::new()),
            Arc::new(MockTransport::new()),
            Arc::new(fetchflow_core::notify::NullNotifier),
        );
    assert!(result.is_err());
}
