//! # Fetchflow Runtime
//!
//! Runtime for the fetchflow remote-resource lifecycle.
//!
//! This crate wires the pure core types into a running system:
//!
//! - **Dispatcher**: the ordered stream of `(identifier, payload)` signals
//!   connecting tasks, watchers, and slices
//! - **Effect task**: one remote call with a single suspension point,
//!   emitting exactly one terminal signal
//! - **Watcher**: a standing subscription that spawns a task per Request
//!   signal, with an explicit concurrency policy
//! - **`AppStore`**: the root composition, aggregating many slices into one
//!   state tree and many watchers under one supervisor, plus the persistence
//!   boundary
//!
//! ## Example
//!
//! ```ignore
//! use fetchflow_core::{transport::Verb, notify::NullNotifier};
//! use fetchflow_http::HttpTransport;
//! use fetchflow_runtime::{AppStore, TaskBlueprint};
//! use std::sync::Arc;
//!
//! let store = AppStore::builder()
//!     .resource("widgets")
//!     .watch("widgets", TaskBlueprint::new(Verb::Get, "/v1/widgets"))
//!     .persist_resource("widgets")
//!     .build(
//!         Arc::new(HttpTransport::new("https://api.example.com")?),
//!         Arc::new(HttpTransport::fixture()?),
//!         Arc::new(NullNotifier),
//!     )?;
//!
//! store.request("widgets", serde_json::json!({"page": 1})).await?;
//! ```

pub mod dispatch;
pub mod persist;
pub mod store;
pub mod task;
pub mod watcher;

/// Error types for the store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur composing or driving a store
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// A signal referenced a resource the store never registered
        #[error("resource {0:?} is not registered")]
        UnknownResource(String),

        /// Two registrations derived the same signal identifiers
        ///
        /// Signal identifiers are the sole correlation key between dispatch
        /// and transition, so resource names must be unique
        /// (case-insensitively) across the whole store.
        #[error("resource {0:?} is registered twice")]
        DuplicateResource(String),

        /// The dispatch stream closed, typically because the store shut down
        #[error("dispatch stream closed")]
        ChannelClosed,

        /// No terminal signal arrived within the allowed time
        #[error("timed out waiting for a terminal signal")]
        Timeout,
    }
}

pub use dispatch::Dispatcher;
pub use error::StoreError;
pub use persist::{JsonFileStorage, PersistError, PersistedTree, SnapshotStorage};
pub use store::{AppStore, AppStoreBuilder};
pub use task::{EffectTask, TaskEnvironment, TaskOptions};
pub use watcher::{Concurrency, TaskBlueprint, Watcher};
