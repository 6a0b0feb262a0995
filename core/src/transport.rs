//! The HTTP transport boundary.
//!
//! The transport executes one remote call per invocation and reports its
//! outcome in two channels:
//!
//! - `Ok(TransportResponse)` for every call that produced an HTTP status,
//!   **including 4xx/5xx**; the effect task classifies the status itself
//! - `Err(TransportError)` only for network-level failures (connect,
//!   timeout, malformed body)
//!
//! Implementations live outside this crate (`fetchflow-http` for reqwest,
//! `fetchflow-testing` for scripted mocks). The transport is stateless from
//! the core's perspective: shared by reference, never mutated.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Header pairs attached to a single call.
pub type Headers = Vec<(String, String)>;

/// HTTP verbs the effect task dispatches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// GET: the whole request payload is sanitized into query parameters
    Get,
    /// POST: payload travels as the request body
    Post,
    /// PUT: payload travels as the request body
    Put,
    /// PATCH: payload travels as the request body
    Patch,
    /// DELETE: payload travels as the request body
    Delete,
}

impl Verb {
    /// Lowercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Whether this verb carries the payload in the request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Parse a method name, falling back to GET.
    ///
    /// Unrecognized methods are treated as GET rather than rejected, matching
    /// the dispatch rule of the effect task (anything that is not
    /// post/put/patch/delete goes out as a query-parameter GET).
    #[must_use]
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_lowercase().as_str() {
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            _ => Self::Get,
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options attached to a single transport call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallOptions {
    /// Extra headers merged over the transport's defaults
    pub headers: Option<Headers>,
    /// Query parameters, as a JSON object of scalar values
    pub params: Option<Value>,
}

/// The outcome of a call that produced an HTTP status.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// The response body parsed as JSON, `None` when there was none
    pub body: Option<Value>,
}

impl TransportResponse {
    /// Whether the status is a failure (>= 400).
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status >= 400
    }

    /// The body's explicit success flag, when the envelope carries one.
    ///
    /// Response envelopes may carry `{"status": bool, "message": string}`;
    /// notifications key off this flag.
    #[must_use]
    pub fn body_flag(&self) -> Option<bool> {
        self.body.as_ref()?.get("status")?.as_bool()
    }

    /// The body's message field, when the envelope carries one.
    #[must_use]
    pub fn body_message(&self) -> Option<&str> {
        self.body.as_ref()?.get("message")?.as_str()
    }
}

/// A network-level failure: the call never produced an HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The call exceeded the transport's timeout
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response arrived but its body could not be read or parsed
    #[error("malformed response: {0}")]
    Decode(String),

    /// Anything else the underlying client reports
    #[error("transport failure: {0}")]
    Other(String),
}

/// A transport error classified into notification-ready fields.
///
/// `message` is what a user may be shown (absent when there is nothing
/// recoverable to show); `data` is what lands in the slice as the failure
/// payload.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedError {
    /// Human-presentable message, if one can be recovered
    pub message: Option<String>,
    /// Failure payload for the slice
    pub data: Value,
}

impl From<&TransportError> for NormalizedError {
    /// Classify a raw transport error.
    ///
    /// Decode failures carry no recoverable message (the body was garbage,
    /// so there is nothing worth surfacing to a user) and therefore produce
    /// no notification downstream.
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout => Self {
                message: Some("Request timed out".to_string()),
                data: serde_json::json!({"reason": "timeout"}),
            },
            TransportError::Connect(detail) => Self {
                message: Some("Network error".to_string()),
                data: serde_json::json!({"reason": detail}),
            },
            TransportError::Decode(detail) => Self {
                message: None,
                data: serde_json::json!({"reason": detail}),
            },
            TransportError::Other(detail) => Self {
                message: Some(detail.clone()),
                data: serde_json::json!({"reason": detail}),
            },
        }
    }
}

/// Boxed future returned by transport calls.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;

/// The HTTP transport collaborator.
///
/// # Dyn Compatibility
///
/// This trait returns an explicit `Pin<Box<dyn Future>>` instead of using
/// `async fn` so it can be used as a trait object (`Arc<dyn Transport>`).
/// The effect task holds its transports behind `Arc` and picks one per call.
pub trait Transport: Send + Sync {
    /// Execute one call.
    ///
    /// `body` is `None` for GET-shaped calls; query parameters and headers
    /// travel in `options` for every verb.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only for network-level failures. A 4xx/5xx
    /// response is an `Ok` with the failure status.
    fn call(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        options: CallOptions,
    ) -> TransportFuture<'_>;
}

/// Whether an endpoint path is an absolute URL.
///
/// Absolute endpoints (`http://` / `https://`) route through the secondary
/// fixture transport; everything else goes to the primary transport.
#[must_use]
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
