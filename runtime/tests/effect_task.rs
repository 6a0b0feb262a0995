//! Effect task behavior against scripted transports.

use fetchflow_core::signal::{Signal, SignalSet};
use fetchflow_core::transport::{TransportError, Verb};
use fetchflow_core::Severity;
use fetchflow_runtime::{Dispatcher, EffectTask, TaskEnvironment, TaskOptions};
use fetchflow_testing::{MockTransport, RecordingNotifier};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

fn environment(
    primary: MockTransport,
    fixture: MockTransport,
) -> (TaskEnvironment, Arc<MockTransport>, Arc<MockTransport>, Arc<RecordingNotifier>, Receiver<Signal>) {
    let primary = Arc::new(primary);
    let fixture = Arc::new(fixture);
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = Dispatcher::default();
    let rx = dispatcher.subscribe();
    let env = TaskEnvironment::new(
        Arc::clone(&primary) as Arc<dyn fetchflow_core::Transport>,
        Arc::clone(&fixture) as Arc<dyn fetchflow_core::Transport>,
        Arc::clone(&notifier) as Arc<dyn fetchflow_core::Notifier>,
        dispatcher,
    );
    (env, primary, fixture, notifier, rx)
}

async fn next_signal(rx: &mut Receiver<Signal>) -> Signal {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a signal")
        .expect("dispatch stream closed")
}

#[tokio::test]
async fn get_sends_the_sanitized_payload_as_params() {
    let (env, primary, _, _, mut rx) = environment(
        MockTransport::new().status(200, json!({"items": []})),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Get,
        "/v1/widgets",
        json!({"page": 1, "search": "", "skip": null}),
        TaskOptions::default(),
    )
    .run(&env)
    .await;

    let calls = primary.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].verb, Verb::Get);
    assert!(calls[0].body.is_none());
    assert_eq!(calls[0].options.params, Some(json!({"page": 1})));

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.success());
}

#[tokio::test]
async fn body_verbs_extract_params_out_of_the_payload() {
    let (env, primary, _, _, mut rx) = environment(
        MockTransport::new().status(200, json!({"ok": true})),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Post,
        "/v1/widgets",
        json!({"name": "gear", "params": {"dry_run": true, "noise": null}}),
        TaskOptions::default().with_query_params(),
    )
    .run(&env)
    .await;

    let calls = primary.calls();
    assert_eq!(calls.len(), 1);
    // `params` was consumed out of the body before it went out
    assert_eq!(calls[0].body, Some(json!({"name": "gear"})));
    assert_eq!(calls[0].options.params, Some(json!({"dry_run": true})));

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.success());
}

#[tokio::test]
async fn without_the_flag_params_stay_in_the_body() {
    let (env, primary, _, _, _rx) = environment(
        MockTransport::new().status(200, json!({})),
        MockTransport::new(),
    );

    EffectTask::new(
        SignalSet::new("widgets"),
        Verb::Post,
        "/v1/widgets",
        json!({"name": "gear", "params": {"dry_run": true}}),
        TaskOptions::default(),
    )
    .run(&env)
    .await;

    let calls = primary.calls();
    assert_eq!(
        calls[0].body,
        Some(json!({"name": "gear", "params": {"dry_run": true}}))
    );
    assert_eq!(calls[0].options.params, None);
}

#[tokio::test]
async fn absolute_endpoints_route_to_the_fixture_transport() {
    let (env, primary, fixture, _, mut rx) = environment(
        MockTransport::new(),
        MockTransport::new().status(200, json!({"stub": true})),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Get,
        "https://fixtures.local/widgets",
        Value::Null,
        TaskOptions::default(),
    )
    .run(&env)
    .await;

    assert_eq!(primary.call_count(), 0);
    assert_eq!(fixture.call_count(), 1);

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.success());
    assert_eq!(signal.payload, json!({"stub": true}));
}

#[tokio::test]
async fn failure_status_without_a_body_falls_back_to_unknown_error() {
    let (env, _, _, notifier, mut rx) = environment(
        MockTransport::new().status_empty(502),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Get,
        "/v1/widgets",
        Value::Null,
        TaskOptions::default().with_notify(),
    )
    .run(&env)
    .await;

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.failed());
    assert_eq!(signal.payload, json!("Unknown error"));
    // No envelope flag, no notification
    assert!(notifier.is_empty());
}

#[tokio::test]
async fn success_notification_requires_flag_and_envelope() {
    let (env, _, _, notifier, mut rx) = environment(
        MockTransport::new().status(200, json!({"status": true, "message": "saved"})),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Post,
        "/v1/widgets",
        json!({}),
        TaskOptions::default().with_notify(),
    )
    .run(&env)
    .await;

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.success());
    assert_eq!(
        notifier.events(),
        vec![("saved".to_string(), Severity::Success)]
    );
}

#[tokio::test]
async fn success_envelope_without_notify_flag_stays_quiet() {
    let (env, _, _, notifier, mut rx) = environment(
        MockTransport::new().status(200, json!({"status": true, "message": "saved"})),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Post,
        "/v1/widgets",
        json!({}),
        TaskOptions::default(),
    )
    .run(&env)
    .await;

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.success());
    assert!(notifier.is_empty());
}

#[tokio::test]
async fn transport_errors_always_notify_when_a_message_exists() {
    // notify flag is off; the thrown-error path notifies anyway
    let (env, _, _, notifier, mut rx) = environment(
        MockTransport::new().fail(TransportError::Timeout),
        MockTransport::new(),
    );
    let signals = SignalSet::new("widgets");

    EffectTask::new(
        signals.clone(),
        Verb::Get,
        "/v1/widgets",
        Value::Null,
        TaskOptions::default(),
    )
    .run(&env)
    .await;

    let signal = next_signal(&mut rx).await;
    assert_eq!(signal.id, signals.failed());
    assert_eq!(signal.payload, json!({"reason": "timeout"}));
    assert_eq!(
        notifier.events(),
        vec![("Request timed out".to_string(), Severity::Error)]
    );
}
