use crate::domain::RepositoryRecord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Observer of a lookup's progress.
///
/// In asynchronous mode callbacks run on worker threads; callers needing a
/// particular thread must re-dispatch. Callbacks run while the lookup holds its
/// shared lock, so they may query the lookup freely. A `cancel` issued from a
/// callback takes effect once the current notification has been delivered.
pub trait LookupListener: Send + Sync {
    fn on_started(&self) {}

    /// One batch of newly discovered records (never the accumulated set)
    fn on_partial_results(&self, _batch: &[RepositoryRecord]) {}

    fn on_completed(&self) {}

    fn on_canceled(&self) {}
}

/// Handle returned by `Lookup::add_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Entries = Arc<Vec<(ListenerId, Arc<dyn LookupListener>)>>;

/// Copy-on-write listener list; notification iterates a snapshot
pub(crate) struct ListenerRegistry {
    entries: Mutex<Entries>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn add(&self, listener: Arc<dyn LookupListener>) -> ListenerId {
        let id = self.next_id();
        let mut entries = self.entries.lock();
        let mut updated = entries.as_ref().clone();
        updated.push((id, listener));
        *entries = Arc::new(updated);
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        if !entries.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let updated = entries
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *entries = Arc::new(updated);
        true
    }

    pub fn snapshot(&self) -> Entries {
        Arc::clone(&self.entries.lock())
    }

    /// Forget every listener; snapshots taken before keep theirs
    pub fn clear(&self) {
        *self.entries.lock() = Arc::new(Vec::new());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Lookup notifications as values
#[derive(Debug, Clone, PartialEq)]
pub enum LookupEvent {
    Started,
    PartialResults(Vec<RepositoryRecord>),
    Completed,
    Canceled,
}

impl LookupEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LookupEvent::Completed | LookupEvent::Canceled)
    }
}

/// Listener that forwards every notification over a channel
pub struct ChannelListener {
    sender: Sender<LookupEvent>,
}

impl ChannelListener {
    pub fn new() -> (Arc<Self>, Receiver<LookupEvent>) {
        let (sender, receiver) = unbounded();
        (Arc::new(Self { sender }), receiver)
    }

    fn forward(&self, event: LookupEvent) {
        // Receiver dropped means nobody is watching anymore
        let _ = self.sender.send(event);
    }
}

impl LookupListener for ChannelListener {
    fn on_started(&self) {
        self.forward(LookupEvent::Started);
    }

    fn on_partial_results(&self, batch: &[RepositoryRecord]) {
        self.forward(LookupEvent::PartialResults(batch.to_vec()));
    }

    fn on_completed(&self) {
        self.forward(LookupEvent::Completed);
    }

    fn on_canceled(&self) {
        self.forward(LookupEvent::Canceled);
    }
}
