//! The dispatch stream.
//!
//! An append-only broadcast of [`Signal`]s. Watchers subscribe to it filtered
//! by identifier; effect tasks publish terminal signals to it; the store's
//! driver loop applies every signal to the owning slice. Publishing never
//! blocks, and a subscriber that lags simply skips ahead (the broadcast
//! channel drops the oldest buffered signals and reports how many).

use fetchflow_core::Signal;
use tokio::sync::broadcast;

/// Default broadcast capacity; enough for bursts of concurrent lifecycles.
const DEFAULT_CAPACITY: usize = 64;

/// Handle to the dispatch stream.
///
/// Cloning a `Dispatcher` clones a handle to the same stream.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: broadcast::Sender<Signal>,
}

impl Dispatcher {
    /// Create a stream buffering up to `capacity` signals per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a signal.
    ///
    /// A signal published while nobody subscribes is dropped silently; that
    /// only happens during store teardown.
    pub fn dispatch(&self, signal: Signal) {
        tracing::trace!(id = %signal.id, "dispatch");
        let _ = self.tx.send(signal);
    }

    /// Subscribe to every signal published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
