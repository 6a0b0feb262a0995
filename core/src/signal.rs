//! Lifecycle signal identifiers for named resources.
//!
//! Every resource owns five canonical signal identifiers derived
//! deterministically from its name. The identifiers are the sole correlation
//! key between dispatch events and slice transitions: the dispatch stream
//! carries `(identifier, payload)` pairs, and a slice recognizes its own
//! identifiers through [`SignalSet::kind_of`].
//!
//! The source of truth for dispatch remains a string identifier (it must be
//! stable, serializable, and comparable across process boundaries), but all
//! transition logic goes through the tagged [`SignalKind`] so that matches
//! stay exhaustive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five canonical lifecycle phases of a remote-resource call.
///
/// `Request`, `Success`, and `Failed` form the call lifecycle proper
/// (`Success`/`Failed` are the terminal phases). `Reset` clears a slice back
/// to an empty value, and `Store` seeds data locally without an in-flight
/// call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A remote call has been requested
    Request,
    /// The call completed with a success status
    Success,
    /// The call completed with a failure status or raised an error
    Failed,
    /// Clear the slice to an explicitly-empty value
    Reset,
    /// Seed the slice's data locally, leaving loading/error untouched
    Store,
}

impl SignalKind {
    /// The identifier suffix for this phase.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Reset => "RESET",
            Self::Store => "STORE",
        }
    }

    /// Whether this phase ends an in-flight call.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// The five lifecycle identifiers of one resource.
///
/// Identifiers are built as `UPPERCASE(resource) + "_" + SUFFIX`. An empty
/// resource name is valid and yields identifiers with an empty prefix
/// (`_REQUEST`, `_SUCCESS`, ...).
///
/// # Uniqueness
///
/// Identifiers must be unique across the whole system: no two resources may
/// share a name (case-insensitively). The composition layer enforces this at
/// registration time; this type only guarantees determinism and stability.
///
/// # Examples
///
/// ```
/// use fetchflow_core::signal::{SignalKind, SignalSet};
///
/// let signals = SignalSet::new("widgets");
/// assert_eq!(signals.request(), "WIDGETS_REQUEST");
/// assert_eq!(signals.kind_of("WIDGETS_FAILED"), Some(SignalKind::Failed));
/// assert_eq!(signals.kind_of("GADGETS_FAILED"), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    resource: String,
    request: String,
    success: String,
    failed: String,
    reset: String,
    store: String,
}

impl SignalSet {
    /// Derive the five identifiers from a resource name.
    #[must_use]
    pub fn new(resource: &str) -> Self {
        let prefix = resource.to_uppercase();
        Self {
            resource: resource.to_string(),
            request: format!("{prefix}_{}", SignalKind::Request.suffix()),
            success: format!("{prefix}_{}", SignalKind::Success.suffix()),
            failed: format!("{prefix}_{}", SignalKind::Failed.suffix()),
            reset: format!("{prefix}_{}", SignalKind::Reset.suffix()),
            store: format!("{prefix}_{}", SignalKind::Store.suffix()),
        }
    }

    /// The resource name these identifiers were derived from.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The Request identifier.
    #[must_use]
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The Success identifier.
    #[must_use]
    pub fn success(&self) -> &str {
        &self.success
    }

    /// The Failed identifier.
    #[must_use]
    pub fn failed(&self) -> &str {
        &self.failed
    }

    /// The Reset identifier.
    #[must_use]
    pub fn reset(&self) -> &str {
        &self.reset
    }

    /// The Store identifier.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.store
    }

    /// The identifier for a given lifecycle phase.
    #[must_use]
    pub fn id(&self, kind: SignalKind) -> &str {
        match kind {
            SignalKind::Request => &self.request,
            SignalKind::Success => &self.success,
            SignalKind::Failed => &self.failed,
            SignalKind::Reset => &self.reset,
            SignalKind::Store => &self.store,
        }
    }

    /// Map an identifier back to its lifecycle phase.
    ///
    /// Returns `None` for identifiers that belong to another resource (or to
    /// nothing at all); callers treat that as a no-op, not an error.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<SignalKind> {
        if id == self.request {
            Some(SignalKind::Request)
        } else if id == self.success {
            Some(SignalKind::Success)
        } else if id == self.failed {
            Some(SignalKind::Failed)
        } else if id == self.reset {
            Some(SignalKind::Reset)
        } else if id == self.store {
            Some(SignalKind::Store)
        } else {
            None
        }
    }
}

/// One event on the dispatch stream: an identifier plus a payload.
///
/// Payloads are JSON values so that every signal (and therefore every slice
/// state derived from signals) stays serializable for persistence and replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The lifecycle identifier, e.g. `WIDGETS_SUCCESS`
    pub id: String,
    /// The payload carried by the signal (`Null` when there is none)
    pub payload: Value,
}

impl Signal {
    /// Create a signal with a payload.
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Create a signal with no payload.
    pub fn bare(id: impl Into<String>) -> Self {
        Self::new(id, Value::Null)
    }
}
