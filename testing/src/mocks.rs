//! Mock collaborators for exercising effect tasks without a network.

use fetchflow_core::notify::{Notifier, Severity};
use fetchflow_core::transport::{
    CallOptions, Transport, TransportError, TransportFuture, TransportResponse, Verb,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One call as the mock transport saw it.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Verb of the call
    pub verb: Verb,
    /// Endpoint path as given
    pub path: String,
    /// Body payload, `None` for GET-shaped calls
    pub body: Option<Value>,
    /// Headers and params the task attached
    pub options: CallOptions,
}

struct ScriptedReply {
    result: Result<TransportResponse, TransportError>,
    delay: Duration,
}

/// A transport that replays a scripted queue of outcomes.
///
/// Replies are consumed in FIFO order; each can carry a delay so tests can
/// race two in-flight tasks deterministically. Every call is recorded.
/// An exhausted script answers with a `TransportError::Other`, which an
/// effect task converts into a Failed emission, so tests asserting call
/// counts catch the mistake either way.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// An empty transport; queue replies with the builder methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    #[must_use]
    pub fn reply(self, response: TransportResponse) -> Self {
        self.reply_after(response, Duration::ZERO)
    }

    /// Queue a response delivered after `delay`.
    #[must_use]
    pub fn reply_after(self, response: TransportResponse, delay: Duration) -> Self {
        self.push(ScriptedReply {
            result: Ok(response),
            delay,
        });
        self
    }

    /// Queue a status/body pair.
    #[must_use]
    pub fn status(self, status: u16, body: Value) -> Self {
        self.reply(TransportResponse {
            status,
            body: Some(body),
        })
    }

    /// Queue a bodyless status.
    #[must_use]
    pub fn status_empty(self, status: u16) -> Self {
        self.reply(TransportResponse { status, body: None })
    }

    /// Queue a network-level failure.
    #[must_use]
    pub fn fail(self, error: TransportError) -> Self {
        self.push(ScriptedReply {
            result: Err(error),
            delay: Duration::ZERO,
        });
        self
    }

    /// Everything this transport was asked to do, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, reply: ScriptedReply) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }
}

impl Transport for MockTransport {
    fn call(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        options: CallOptions,
    ) -> TransportFuture<'_> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                verb,
                path: path.to_string(),
                body: body.cloned(),
                options,
            });

        let reply = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        Box::pin(async move {
            match reply {
                Some(reply) => {
                    if reply.delay > Duration::ZERO {
                        tokio::time::sleep(reply.delay).await;
                    }
                    reply.result
                }
                None => Err(TransportError::Other("mock script exhausted".to_string())),
            }
        })
    }
}

/// A notifier that records every message it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Severity)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether nothing was surfaced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), severity));
    }
}
