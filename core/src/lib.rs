//! # Fetchflow Core
//!
//! Core types for the fetchflow remote-resource lifecycle.
//!
//! Fetchflow standardizes the lifecycle of an asynchronous remote call inside
//! a reactive state container. A named **resource** gets:
//!
//! - a [`SignalSet`](signal::SignalSet): five canonical lifecycle identifiers
//!   (Request, Success, Failed, Reset, Store) derived from the resource name
//! - a [`Slice`](slice::Slice): a state fragment (`loading` / `data` / `error`)
//!   whose transitions are driven purely by those signals
//! - an effect task (in the runtime crate) that performs one remote call and
//!   emits exactly one terminal signal back into the slice
//!
//! ## Architecture Principles
//!
//! - Pure transitions: slice state is only ever mutated by the transition
//!   function in response to a signal, never written directly by a task
//! - Signal identifiers are the sole correlation key between dispatch and
//!   transition
//! - External collaborators (transport, notifications) sit behind traits and
//!   are shared as `Arc<dyn ...>`
//!
//! ## Example
//!
//! ```
//! use fetchflow_core::{Signal, SignalKind, Slice};
//! use serde_json::json;
//!
//! let slice = Slice::new("widgets");
//! let mut state = Slice::initial_state();
//!
//! let request = Signal::bare(slice.signals().request());
//! slice.apply(&mut state, &request);
//! assert!(state.loading);
//!
//! let success = Signal::new(
//!     slice.signals().id(SignalKind::Success),
//!     json!({"items": [1, 2, 3]}),
//! );
//! slice.apply(&mut state, &success);
//! assert!(!state.loading);
//! assert_eq!(state.data, Some(json!({"items": [1, 2, 3]})));
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};

pub mod notify;
pub mod query;
pub mod signal;
pub mod slice;
pub mod transport;

pub use notify::{Notifier, Severity};
pub use query::sanitize;
pub use signal::{Signal, SignalKind, SignalSet};
pub use slice::{Slice, SliceState};
pub use transport::{
    CallOptions, Headers, NormalizedError, Transport, TransportError, TransportResponse, Verb,
};
