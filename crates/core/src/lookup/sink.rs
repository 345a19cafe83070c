use super::state::LookupState;
use super::Inner;
use crate::domain::RepositoryRecord;
use tracing::debug;

impl Inner {
    /// Append one batch and broadcast exactly that batch to listeners.
    ///
    /// Batches arriving after cancellation are dropped. The append and the
    /// broadcast happen under one write-then-downgraded guard, so listeners
    /// never observe a half-appended batch.
    pub(crate) fn add_results(&self, batch: Vec<RepositoryRecord>) {
        if batch.is_empty() {
            return;
        }
        let mut shared = self.shared.write();
        if shared.state == LookupState::Canceled {
            debug!("Dropping {} results, lookup was canceled", batch.len());
            return;
        }
        shared.results.extend(batch.iter().cloned());
        self.deliver(shared, |listener| listener.on_partial_results(&batch));
    }
}
