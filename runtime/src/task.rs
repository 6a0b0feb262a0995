//! Effect tasks: one remote call, one terminal signal.
//!
//! An [`EffectTask`] is the ephemeral unit of work behind a Request signal.
//! Running it performs a single pass with no retry:
//!
//! 1. classify the endpoint (absolute URLs go to the fixture transport)
//! 2. extract and sanitize query parameters out of the payload
//! 3. dispatch by verb (body verbs send the payload, GET sends it as params)
//! 4. suspend on the transport call, the task's only suspension point
//! 5. classify the outcome and emit Success or Failed into the slice
//!
//! A task never retries, never rethrows past its own boundary, and cannot
//! fail observably to its spawner: every reachable path converts into a
//! terminal emission plus (on thrown errors) a log entry.

use crate::dispatch::Dispatcher;
use fetchflow_core::query::sanitize;
use fetchflow_core::signal::{Signal, SignalKind, SignalSet};
use fetchflow_core::transport::{
    is_absolute_url, CallOptions, Headers, NormalizedError, Transport, TransportResponse, Verb,
};
use fetchflow_core::{Notifier, Severity};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Behavioral flags for one task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Surface success/error notifications when the response envelope asks
    /// for them (`{"status": bool, "message": string}`)
    pub notify: bool,
    /// Extract `payload.params` into sanitized query parameters
    pub include_query_params: bool,
}

impl TaskOptions {
    /// Enable notifications.
    #[must_use]
    pub const fn with_notify(mut self) -> Self {
        self.notify = true;
        self
    }

    /// Enable query-parameter extraction.
    #[must_use]
    pub const fn with_query_params(mut self) -> Self {
        self.include_query_params = true;
        self
    }
}

/// The collaborators every effect task runs against.
///
/// Shared by reference between all tasks of a store; nothing here is mutated
/// by a task.
#[derive(Clone)]
pub struct TaskEnvironment {
    /// Transport for relative endpoint paths
    pub primary: Arc<dyn Transport>,
    /// Transport for absolute (`http://` / `https://`) endpoints
    pub fixture: Arc<dyn Transport>,
    /// Notification collaborator
    pub notifier: Arc<dyn Notifier>,
    /// The dispatch stream terminal signals are published to
    pub dispatcher: Dispatcher,
}

impl TaskEnvironment {
    /// Bundle the collaborators.
    #[must_use]
    pub fn new(
        primary: Arc<dyn Transport>,
        fixture: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            primary,
            fixture,
            notifier,
            dispatcher,
        }
    }
}

impl std::fmt::Debug for TaskEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEnvironment")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Supersession gate handed to a task by a `Latest` watcher.
///
/// The stamp is compared against the shared counter immediately before the
/// terminal signal is published; a stale stamp means a newer Request for the
/// same resource superseded this task, and its outcome is dropped.
#[derive(Clone, Debug)]
pub(crate) struct Gate {
    counter: Arc<AtomicU64>,
    stamp: u64,
}

impl Gate {
    pub(crate) const fn new(counter: Arc<AtomicU64>, stamp: u64) -> Self {
        Self { counter, stamp }
    }

    fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.stamp
    }
}

/// One suspendable unit of work: a remote call plus its terminal emission.
#[derive(Clone, Debug)]
pub struct EffectTask {
    signals: SignalSet,
    verb: Verb,
    endpoint: String,
    payload: Value,
    options: TaskOptions,
    headers: Option<Headers>,
    gate: Option<Gate>,
}

impl EffectTask {
    /// Describe one remote call for a resource.
    pub fn new(
        signals: SignalSet,
        verb: Verb,
        endpoint: impl Into<String>,
        payload: Value,
        options: TaskOptions,
    ) -> Self {
        Self {
            signals,
            verb,
            endpoint: endpoint.into(),
            payload,
            options,
            headers: None,
            gate: None,
        }
    }

    /// Attach per-call headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub(crate) fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Perform the call and emit the terminal signal.
    ///
    /// Consumes the task: each Request spawns a fresh instance. The payload
    /// is deliberately mutated along the way; query-parameter extraction
    /// removes `params` from the body before it is sent, and callers rely on
    /// the body going out without it.
    pub async fn run(mut self, env: &TaskEnvironment) {
        let transport = if is_absolute_url(&self.endpoint) {
            &env.fixture
        } else {
            &env.primary
        };

        let mut params = None;
        if self.options.include_query_params {
            if let Value::Object(body) = &mut self.payload {
                if let Some(raw) = body.remove("params") {
                    params = Some(sanitize(&raw));
                }
            }
        }

        let result = if self.verb.has_body() {
            let options = CallOptions {
                headers: self.headers.clone(),
                params,
            };
            transport
                .call(self.verb, &self.endpoint, Some(&self.payload), options)
                .await
        } else {
            // GET sanitizes the whole payload into query parameters
            let options = CallOptions {
                headers: self.headers.clone(),
                params: Some(sanitize(&self.payload)),
            };
            transport.call(self.verb, &self.endpoint, None, options).await
        };

        match result {
            Ok(response) if !response.is_failure() => self.settle_success(env, &response),
            Ok(response) => self.settle_failure(env, &response),
            Err(err) => {
                let normalized = NormalizedError::from(&err);
                tracing::error!(
                    resource = self.signals.resource(),
                    error = %err,
                    normalized_message = ?normalized.message,
                    normalized_data = %normalized.data,
                    "endpoint call failed"
                );
                let committed = self.emit(env, SignalKind::Failed, normalized.data);
                // This path notifies on a present message regardless of the
                // notify flag
                if committed {
                    if let Some(message) = &normalized.message {
                        env.notifier.notify(message, Severity::Error);
                    }
                }
            }
        }
    }

    fn settle_success(&self, env: &TaskEnvironment, response: &TransportResponse) {
        let payload = response.body.clone().unwrap_or(Value::Null);
        let committed = self.emit(env, SignalKind::Success, payload);
        if committed && self.options.notify && response.body_flag() == Some(true) {
            if let Some(message) = response.body_message() {
                env.notifier.notify(message, Severity::Success);
            }
        }
    }

    fn settle_failure(&self, env: &TaskEnvironment, response: &TransportResponse) {
        let payload = response
            .body
            .clone()
            .unwrap_or_else(|| Value::String("Unknown error".to_string()));
        let committed = self.emit(env, SignalKind::Failed, payload);
        if committed && self.options.notify && response.body_flag() == Some(false) {
            if let Some(message) = response.body_message() {
                env.notifier.notify(message, Severity::Error);
            }
        }
    }

    /// Publish a terminal signal unless a newer task superseded this one.
    ///
    /// Returns whether the emission was committed; notifications follow the
    /// same fate as the signal.
    fn emit(&self, env: &TaskEnvironment, kind: SignalKind, payload: Value) -> bool {
        if let Some(gate) = &self.gate {
            if !gate.is_current() {
                tracing::debug!(
                    resource = self.signals.resource(),
                    signal = self.signals.id(kind),
                    "terminal signal superseded by a newer request, dropping"
                );
                return false;
            }
        }
        env.dispatcher
            .dispatch(Signal::new(self.signals.id(kind), payload));
        true
    }
}
