//! Per-resource state slices and their transition function.
//!
//! A slice is the portion of global state owned by one resource. It is
//! created once at process start and mutated only by [`Slice::apply`] in
//! response to one of the resource's five lifecycle signals. Tasks never
//! write a slice directly; they publish signals and the transition does the
//! rest. The transition is referentially transparent, which is what makes
//! replay and persistence safe.

use crate::signal::{Signal, SignalKind, SignalSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The state fragment owned by one resource.
///
/// # Failure payload mirroring
///
/// On a Failed signal **both** `data` and `error` are set to the failure
/// payload. A failed call therefore leaves `data` populated with error
/// content rather than clearing it; consumers must check `error` before
/// trusting `data`. This is a deliberate contract, not an accident of the
/// transition.
///
/// # Empty vs. cleared
///
/// `data: None` means the resource was never fetched. A Reset writes
/// `Some(Value::Array(vec![]))`, an explicitly-empty sequence that is
/// intentionally distinguishable from the never-fetched initial value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceState {
    /// True strictly between a Request and its terminal signal
    pub loading: bool,
    /// The last successful payload, the mirrored failure payload, or the
    /// Reset/Store value
    pub data: Option<Value>,
    /// The last failure payload, cleared on Request/Success/Reset
    pub error: Option<Value>,
}

impl SliceState {
    /// The state every slice starts in: not loading, never fetched, no error.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }

    /// Whether the last signal applied was a failure.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl Default for SliceState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A resource's slice: its signal set plus the transition function.
///
/// # Examples
///
/// ```
/// use fetchflow_core::{Signal, Slice};
/// use serde_json::json;
///
/// let slice = Slice::new("configs");
/// let mut state = Slice::initial_state();
///
/// slice.apply(&mut state, &Signal::bare(slice.signals().request()));
/// assert!(state.loading);
///
/// slice.apply(
///     &mut state,
///     &Signal::new(slice.signals().success(), json!({"theme": "dark"})),
/// );
/// assert_eq!(state.data, Some(json!({"theme": "dark"})));
/// assert!(state.error.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    signals: SignalSet,
}

impl Slice {
    /// Create the slice for a resource name.
    #[must_use]
    pub fn new(resource: &str) -> Self {
        Self {
            signals: SignalSet::new(resource),
        }
    }

    /// Create a slice from an already-derived signal set.
    #[must_use]
    pub const fn from_signals(signals: SignalSet) -> Self {
        Self { signals }
    }

    /// The resource's signal set.
    #[must_use]
    pub const fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// The resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.signals.resource()
    }

    /// The initial state of any slice.
    #[must_use]
    pub const fn initial_state() -> SliceState {
        SliceState::initial()
    }

    /// Apply one signal to the state.
    ///
    /// Signals whose identifier does not belong to this slice leave the state
    /// untouched (a no-op, not an error). Everything else is an exhaustive
    /// match over [`SignalKind`].
    pub fn apply(&self, state: &mut SliceState, signal: &Signal) {
        let Some(kind) = self.signals.kind_of(&signal.id) else {
            return;
        };

        match kind {
            SignalKind::Request => {
                state.loading = true;
                state.error = None;
            }
            SignalKind::Success => {
                state.loading = false;
                state.data = Some(signal.payload.clone());
                state.error = None;
            }
            SignalKind::Failed => {
                // Failure payload mirroring: data and error carry the same value
                state.loading = false;
                state.data = Some(signal.payload.clone());
                state.error = Some(signal.payload.clone());
            }
            SignalKind::Reset => {
                state.loading = false;
                state.error = None;
                state.data = Some(Value::Array(Vec::new()));
            }
            SignalKind::Store => {
                state.data = Some(signal.payload.clone());
            }
        }
    }
}
