//! Watchers: Request signals in, spawned tasks out.
//!
//! A watcher is a standing subscription on the dispatch stream filtered by
//! one resource's Request identifier. Each observation spawns a fresh
//! [`EffectTask`] immediately; the watcher itself never suspends on task
//! completion and never terminates while the stream is open.

use crate::task::{EffectTask, Gate, TaskEnvironment, TaskOptions};
use fetchflow_core::signal::SignalSet;
use fetchflow_core::transport::{Headers, Verb};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// How concurrent Requests for the same resource are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// At most one logically current in-flight request: a new Request
    /// supersedes the previous task, whose terminal signal is dropped before
    /// publication.
    #[default]
    Latest,

    /// Unbounded: every Request spawns a task and all of them race to write
    /// the slice; the last terminal signal to arrive wins, regardless of
    /// dispatch order.
    Every,
}

/// The fixed shape of the calls a watcher spawns.
///
/// Verb, endpoint, flags, and headers are fixed per resource; the request
/// payload comes from each Request signal.
#[derive(Clone, Debug)]
pub struct TaskBlueprint {
    verb: Verb,
    endpoint: String,
    options: TaskOptions,
    headers: Option<Headers>,
}

impl TaskBlueprint {
    /// Describe the call shape for a resource.
    pub fn new(verb: Verb, endpoint: impl Into<String>) -> Self {
        Self {
            verb,
            endpoint: endpoint.into(),
            options: TaskOptions::default(),
            headers: None,
        }
    }

    /// Set the behavioral flags.
    #[must_use]
    pub fn options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach headers to every spawned call.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// A standing Request-to-task binding for one resource.
#[derive(Clone, Debug)]
pub struct Watcher {
    signals: SignalSet,
    blueprint: TaskBlueprint,
    concurrency: Concurrency,
}

impl Watcher {
    /// Bind a resource's Request signal to a task blueprint.
    #[must_use]
    pub const fn new(signals: SignalSet, blueprint: TaskBlueprint, concurrency: Concurrency) -> Self {
        Self {
            signals,
            blueprint,
            concurrency,
        }
    }

    /// The signal set this watcher listens for.
    #[must_use]
    pub const fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// Start the watch loop.
    ///
    /// The loop runs until the dispatch stream closes. Spawning is
    /// non-blocking: a task instance is started per observed Request and the
    /// loop immediately goes back to listening.
    pub fn spawn(self, env: TaskEnvironment) -> JoinHandle<()> {
        // Subscribe before spawning so a Request dispatched right after
        // registration cannot be missed
        let mut rx = env.dispatcher.subscribe();

        tokio::spawn(async move {
            let generation = Arc::new(AtomicU64::new(0));

            loop {
                match rx.recv().await {
                    Ok(signal) if signal.id == self.signals.request() => {
                        self.spawn_task(&env, &generation, signal.payload);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            resource = self.signals.resource(),
                            skipped,
                            "watcher lagged behind the dispatch stream"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn spawn_task(&self, env: &TaskEnvironment, generation: &Arc<AtomicU64>, payload: Value) {
        tracing::debug!(
            resource = self.signals.resource(),
            verb = %self.blueprint.verb,
            endpoint = %self.blueprint.endpoint,
            "request observed, spawning task"
        );

        let mut task = EffectTask::new(
            self.signals.clone(),
            self.blueprint.verb,
            self.blueprint.endpoint.clone(),
            payload,
            self.blueprint.options,
        );
        if let Some(headers) = &self.blueprint.headers {
            task = task.with_headers(headers.clone());
        }
        if self.concurrency == Concurrency::Latest {
            let stamp = generation.fetch_add(1, Ordering::AcqRel) + 1;
            task = task.with_gate(Gate::new(Arc::clone(generation), stamp));
        }

        let env = env.clone();
        tokio::spawn(async move {
            task.run(&env).await;
        });
    }
}
