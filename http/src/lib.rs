//! # Fetchflow HTTP
//!
//! reqwest-backed implementation of the fetchflow [`Transport`] trait.
//!
//! Two transports are normally wired into a store:
//!
//! - the **primary** transport, built with a base URL that relative endpoint
//!   paths are resolved against
//! - the **fixture** transport, built without a base URL, used for absolute
//!   (`http://` / `https://`) endpoints so the same effect task can serve a
//!   stub backend without branching at call sites
//!
//! ## Example
//!
//! ```ignore
//! use fetchflow_http::HttpTransport;
//!
//! let primary = HttpTransport::builder()
//!     .base_url("https://api.example.com/v1")
//!     .header("x-client", "catalog")
//!     .build()?;
//! let fixture = HttpTransport::fixture()?;
//! ```

use fetchflow_core::transport::{
    is_absolute_url, CallOptions, Headers, Transport, TransportError, TransportFuture,
    TransportResponse, Verb,
};
use serde_json::Value;
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    headers: Headers,
}

impl HttpTransportBuilder {
    /// Base URL that relative paths are resolved against.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout (default 30 seconds).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// A header sent with every request (per-call headers are merged on top).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn build(self) -> Result<HttpTransport, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(HttpTransport {
            client,
            base_url: self.base_url,
            default_headers: self.headers,
        })
    }
}

/// A [`Transport`] over a shared [`reqwest::Client`].
///
/// The client is stateless from the caller's perspective; cloning the
/// transport clones a handle to the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<String>,
    default_headers: Headers,
}

impl HttpTransport {
    /// A builder for configuring base URL, timeout, and default headers.
    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// A primary transport resolving relative paths against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::builder().base_url(base_url).build()
    }

    /// A transport without a base URL, for absolute (fixture) endpoints.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the client cannot be
    /// constructed.
    pub fn fixture() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    /// Resolve an endpoint path to a full URL.
    fn resolve(&self, path: &str) -> Result<String, TransportError> {
        if is_absolute_url(path) {
            return Ok(path.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )),
            None => Err(TransportError::Other(format!(
                "no base URL configured for relative path {path:?}"
            ))),
        }
    }
}

impl Transport for HttpTransport {
    fn call(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        options: CallOptions,
    ) -> TransportFuture<'_> {
        let url = self.resolve(path);
        let body = body.cloned();

        Box::pin(async move {
            let url = url?;
            let method = match verb {
                Verb::Get => reqwest::Method::GET,
                Verb::Post => reqwest::Method::POST,
                Verb::Put => reqwest::Method::PUT,
                Verb::Patch => reqwest::Method::PATCH,
                Verb::Delete => reqwest::Method::DELETE,
            };

            tracing::debug!(verb = %verb, url = %url, "transport call");

            let mut request = self.client.request(method, &url);

            for (name, value) in &self.default_headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some(headers) = options.headers {
                for (name, value) in &headers {
                    request = request.header(name.as_str(), value.as_str());
                }
            }
            if let Some(params) = options.params {
                request = request.query(&flatten_params(&params));
            }
            if let Some(body) = body {
                request = request.json(&body);
            }

            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(map_reqwest_error)?;

            let body = if text.is_empty() {
                None
            } else {
                Some(
                    serde_json::from_str(&text)
                        .map_err(|e| TransportError::Decode(e.to_string()))?,
                )
            };

            Ok(TransportResponse { status, body })
        })
    }
}

/// Flatten a JSON object into query pairs.
///
/// Scalars are stringified (strings without surrounding quotes), null
/// members are skipped, and composite values are serialized as compact JSON.
fn flatten_params(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                composite => serde_json::to_string(composite).ok()?,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
