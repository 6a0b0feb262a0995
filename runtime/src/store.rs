//! Root composition: many slices, one state tree, one task supervisor.
//!
//! The [`AppStore`] owns the dispatch stream, a driver loop that applies
//! every signal to the owning slice, and the watchers that turn Request
//! signals into effect tasks. It contains no novel lifecycle logic of its
//! own; it is wiring around the core types plus the persistence boundary.

use crate::dispatch::Dispatcher;
use crate::error::StoreError;
use crate::persist::{PersistError, PersistedTree, SnapshotStorage};
use crate::task::TaskEnvironment;
use crate::watcher::{Concurrency, TaskBlueprint, Watcher};
use fetchflow_core::signal::{Signal, SignalSet};
use fetchflow_core::slice::{Slice, SliceState};
use fetchflow_core::{Notifier, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Builder collecting resources, watchers, and the persistence whitelist.
#[derive(Debug, Default)]
pub struct AppStoreBuilder {
    resources: Vec<String>,
    watchers: Vec<(String, TaskBlueprint, Concurrency)>,
    whitelist: Vec<String>,
    capacity: Option<usize>,
}

impl AppStoreBuilder {
    /// Register a resource: one signal set, one slice in the tree.
    #[must_use]
    pub fn resource(mut self, name: &str) -> Self {
        self.resources.push(name.to_string());
        self
    }

    /// Bind a resource's Request signal to a task blueprint with the default
    /// `Latest` concurrency policy.
    #[must_use]
    pub fn watch(self, resource: &str, blueprint: TaskBlueprint) -> Self {
        self.watch_with(resource, blueprint, Concurrency::default())
    }

    /// Bind a resource's Request signal with an explicit concurrency policy.
    #[must_use]
    pub fn watch_with(
        mut self,
        resource: &str,
        blueprint: TaskBlueprint,
        concurrency: Concurrency,
    ) -> Self {
        self.watchers
            .push((resource.to_string(), blueprint, concurrency));
        self
    }

    /// Add a resource to the persistence whitelist.
    #[must_use]
    pub fn persist_resource(mut self, name: &str) -> Self {
        self.whitelist.push(name.to_string());
        self
    }

    /// Dispatch stream capacity (per subscriber).
    #[must_use]
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Wire everything up and start the driver loop and watchers.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateResource`] when two registered names derive
    ///   the same signal identifiers (resource names are the correlation key
    ///   and must be unique, case-insensitively)
    /// - [`StoreError::UnknownResource`] when a watcher references a name
    ///   that was never registered
    pub fn build(
        self,
        primary: Arc<dyn Transport>,
        fixture: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<AppStore, StoreError> {
        let mut slices: HashMap<String, Slice> = HashMap::new();
        let mut request_ids: Vec<String> = Vec::new();

        for name in &self.resources {
            let slice = Slice::new(name);
            if request_ids.iter().any(|id| id == slice.signals().request()) {
                return Err(StoreError::DuplicateResource(name.clone()));
            }
            request_ids.push(slice.signals().request().to_string());
            slices.insert(name.clone(), slice);
        }

        for (resource, _, _) in &self.watchers {
            if !slices.contains_key(resource) {
                return Err(StoreError::UnknownResource(resource.clone()));
            }
        }

        let dispatcher = self
            .capacity
            .map_or_else(Dispatcher::default, Dispatcher::new);
        let environment =
            TaskEnvironment::new(primary, fixture, notifier, dispatcher.clone());

        let slices = Arc::new(slices);
        let state: Arc<RwLock<HashMap<String, SliceState>>> = Arc::new(RwLock::new(
            slices
                .keys()
                .map(|name| (name.clone(), SliceState::initial()))
                .collect(),
        ));

        let driver = Self::spawn_driver(&dispatcher, &slices, &state);

        let mut watcher_handles = Vec::with_capacity(self.watchers.len());
        for (resource, blueprint, concurrency) in self.watchers {
            // Registration was validated above
            if let Some(slice) = slices.get(&resource) {
                let watcher =
                    Watcher::new(slice.signals().clone(), blueprint, concurrency);
                watcher_handles.push(watcher.spawn(environment.clone()));
            }
        }

        tracing::info!(
            resources = slices.len(),
            watchers = watcher_handles.len(),
            persisted = self.whitelist.len(),
            "store composed"
        );

        Ok(AppStore {
            dispatcher,
            slices,
            state,
            environment,
            watcher_handles,
            driver,
            whitelist: self.whitelist,
        })
    }

    /// The driver loop: apply every dispatched signal to the owning slice.
    ///
    /// A single subscriber applies signals in publication order, which is
    /// what gives "Request visible before the same task's terminal signal".
    fn spawn_driver(
        dispatcher: &Dispatcher,
        slices: &Arc<HashMap<String, Slice>>,
        state: &Arc<RwLock<HashMap<String, SliceState>>>,
    ) -> JoinHandle<()> {
        let mut rx = dispatcher.subscribe();
        let slices = Arc::clone(slices);
        let state = Arc::clone(state);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) => {
                        let Some(slice) = slices
                            .values()
                            .find(|slice| slice.signals().kind_of(&signal.id).is_some())
                        else {
                            tracing::trace!(id = %signal.id, "signal owned by no slice");
                            continue;
                        };

                        let mut tree = state.write().await;
                        if let Some(entry) = tree.get_mut(slice.resource()) {
                            slice.apply(entry, &signal);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "driver lagged behind the dispatch stream");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// The composed store.
pub struct AppStore {
    dispatcher: Dispatcher,
    slices: Arc<HashMap<String, Slice>>,
    state: Arc<RwLock<HashMap<String, SliceState>>>,
    environment: TaskEnvironment,
    watcher_handles: Vec<JoinHandle<()>>,
    driver: JoinHandle<()>,
    whitelist: Vec<String>,
}

impl AppStore {
    /// Start composing a store.
    #[must_use]
    pub fn builder() -> AppStoreBuilder {
        AppStoreBuilder::default()
    }

    /// The signal set of a registered resource.
    #[must_use]
    pub fn signals(&self, resource: &str) -> Option<&SignalSet> {
        self.slices.get(resource).map(Slice::signals)
    }

    /// Publish a raw signal onto the dispatch stream.
    pub fn dispatch(&self, signal: Signal) {
        self.dispatcher.dispatch(signal);
    }

    /// Dispatch a Request for a resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownResource`] for unregistered names.
    pub fn request(&self, resource: &str, payload: Value) -> Result<(), StoreError> {
        let signals = self
            .signals(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;
        self.dispatcher
            .dispatch(Signal::new(signals.request(), payload));
        Ok(())
    }

    /// Dispatch a Reset for a resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownResource`] for unregistered names.
    pub fn reset(&self, resource: &str) -> Result<(), StoreError> {
        let signals = self
            .signals(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;
        self.dispatcher.dispatch(Signal::bare(signals.reset()));
        Ok(())
    }

    /// Seed a resource's data locally (a Store signal, no call involved).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownResource`] for unregistered names.
    pub fn seed(&self, resource: &str, payload: Value) -> Result<(), StoreError> {
        let signals = self
            .signals(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;
        self.dispatcher
            .dispatch(Signal::new(signals.store(), payload));
        Ok(())
    }

    /// Dispatch a Request and wait for the resource's next terminal signal.
    ///
    /// Subscribes before dispatching so the terminal signal cannot be missed,
    /// then waits for the first Success or Failed belonging to `resource`.
    /// Note that receiving the terminal signal does not guarantee the driver
    /// has already applied it; readers polling state should allow for that.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownResource`] for unregistered names
    /// - [`StoreError::Timeout`] when no terminal signal arrives in time
    /// - [`StoreError::ChannelClosed`] when the stream closes while waiting
    pub async fn request_and_wait(
        &self,
        resource: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Signal, StoreError> {
        let signals = self
            .signals(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?
            .clone();

        let mut rx = self.dispatcher.subscribe();
        self.dispatcher
            .dispatch(Signal::new(signals.request(), payload));

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(signal)
                        if signal.id == signals.success() || signal.id == signals.failed() =>
                    {
                        return Ok(signal);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            "terminal-signal waiter lagged behind the dispatch stream"
                        );
                    }
                    Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Read the state tree through a closure so the lock releases promptly.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&HashMap<String, SliceState>) -> T,
    {
        let tree = self.state.read().await;
        f(&tree)
    }

    /// A clone of one resource's slice state.
    pub async fn slice_state(&self, resource: &str) -> Option<SliceState> {
        let tree = self.state.read().await;
        tree.get(resource).cloned()
    }

    /// The collaborators tasks run against.
    #[must_use]
    pub const fn environment(&self) -> &TaskEnvironment {
        &self.environment
    }

    /// Snapshot the whitelisted slices.
    pub async fn snapshot(&self) -> PersistedTree {
        let tree = self.state.read().await;
        let slices = self
            .whitelist
            .iter()
            .filter_map(|name| tree.get(name).map(|s| (name.clone(), s.clone())))
            .collect();
        PersistedTree::new(slices)
    }

    /// Restore slice state from a snapshot.
    ///
    /// Resources present in the snapshot but not registered here are skipped
    /// with a warning; a renamed or retired resource must not poison the
    /// rest of the restore.
    pub async fn hydrate(&self, snapshot: PersistedTree) {
        let mut tree = self.state.write().await;
        for (name, slice_state) in snapshot.slices {
            if let Some(entry) = tree.get_mut(&name) {
                *entry = slice_state;
            } else {
                tracing::warn!(resource = %name, "snapshot contains an unregistered resource");
            }
        }
    }

    /// Snapshot the whitelisted slices into storage.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the storage medium fails.
    pub async fn persist(&self, storage: &dyn SnapshotStorage) -> Result<(), PersistError> {
        let snapshot = self.snapshot().await;
        storage.save(&snapshot)
    }

    /// Restore from storage, if a snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the storage medium fails or the
    /// snapshot does not deserialize.
    pub async fn restore(&self, storage: &dyn SnapshotStorage) -> Result<(), PersistError> {
        if let Some(snapshot) = storage.load()? {
            self.hydrate(snapshot).await;
        }
        Ok(())
    }

    /// Stop the driver loop and all watchers.
    ///
    /// In-flight effect tasks are not cancelled; they run to completion and
    /// their terminal signals land on a stream nobody applies any more.
    pub fn shutdown(&self) {
        tracing::info!("shutting down store");
        for handle in &self.watcher_handles {
            handle.abort();
        }
        self.driver.abort();
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("resources", &self.slices.len())
            .field("watchers", &self.watcher_handles.len())
            .field("whitelist", &self.whitelist)
            .finish_non_exhaustive()
    }
}
