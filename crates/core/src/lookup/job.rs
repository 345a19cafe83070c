//! Job wrapper: counter bookkeeping, failure handling and the two job kinds.

use super::options::FailurePolicy;
use super::state::{LookupFailure, LookupState};
use super::Inner;
use crate::domain::{CollectionRef, Identity, RepositoryRecord};
use anyhow::{anyhow, Context};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// One node of the discovery tree
#[derive(Debug, Clone)]
pub(crate) enum LookupJob {
    /// List the server's collections and schedule one job per collection
    Identity(Identity),
    /// List one collection's repositories and publish them as a batch
    Collection {
        identity: Identity,
        collection: CollectionRef,
    },
}

impl LookupJob {
    fn identity(&self) -> &Identity {
        match self {
            LookupJob::Identity(identity) => identity,
            LookupJob::Collection { identity, .. } => identity,
        }
    }

    fn collection(&self) -> Option<&CollectionRef> {
        match self {
            LookupJob::Identity(_) => None,
            LookupJob::Collection { collection, .. } => Some(collection),
        }
    }
}

/// Releases the job's counter unit however the job ends
struct JobGuard<'a> {
    inner: &'a Inner,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.inner.finish_job();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "job panicked".to_string()
    }
}

impl Inner {
    /// Count `job` as outstanding, then hand it to the pool.
    ///
    /// The increment happens under the write lock before any worker can see
    /// the job, so the counter cannot reach zero while a child is being added.
    pub(crate) fn schedule(self: &Arc<Self>, job: LookupJob) {
        {
            let mut shared = self.shared.write();
            if shared.state != LookupState::Running {
                debug!("Not scheduling {:?}, lookup is {}", job, shared.state);
                return;
            }
            shared.outstanding += 1;
        }

        let Some(pool) = self.pool() else {
            // Canceled between the increment and the dispatch
            debug!("Not dispatching {:?}, lookup already released its pool", job);
            self.finish_job();
            return;
        };
        let this = Arc::clone(self);
        pool.execute(Box::new(move || this.run_wrapped(job)));
    }

    fn run_wrapped(self: &Arc<Self>, job: LookupJob) {
        let _guard = JobGuard { inner: self };
        if self.is_canceled() {
            trace!("Skipping {:?}, lookup was canceled", job);
            return;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_job(&job)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.job_failed(&job, err),
            Err(payload) => self.job_failed(&job, anyhow!("panic: {}", panic_message(payload.as_ref()))),
        }
    }

    fn run_job(self: &Arc<Self>, job: &LookupJob) -> anyhow::Result<()> {
        match job {
            LookupJob::Identity(identity) => {
                let collections = self
                    .discoverers
                    .for_identity(identity)
                    .list_collections(identity)
                    .with_context(|| format!("Failed to list collections on {}", identity.uri))?;
                debug!("Found {} collections on {}", collections.len(), identity.uri);

                for collection in collections {
                    if self.is_canceled() {
                        debug!(
                            "Lookup on collection {} of {} was canceled",
                            collection.name, identity.uri
                        );
                        break;
                    }
                    self.schedule(LookupJob::Collection {
                        identity: identity.clone(),
                        collection,
                    });
                }
            }
            LookupJob::Collection {
                identity,
                collection,
            } => {
                let repositories = self
                    .discoverers
                    .for_identity(identity)
                    .list_repositories(identity, collection)
                    .with_context(|| {
                        format!(
                            "Failed to list repositories in {} on {}",
                            collection.name, identity.uri
                        )
                    })?;
                let found = repositories.len();
                let batch: Vec<RepositoryRecord> = repositories
                    .into_iter()
                    .map(|repository| RepositoryRecord::new(identity, collection, repository))
                    .collect();
                let batch = self.assemble_batch(batch);
                debug!(
                    "Collection {} on {}: {} repositories, {} kept for scope {}",
                    collection.name,
                    identity.uri,
                    found,
                    batch.len(),
                    self.scope
                );
                self.add_results(batch);
            }
        }
        Ok(())
    }

    /// Apply the lookup scope to a collection's records.
    ///
    /// Under `Scope::Project` each project id is claimed once for the whole
    /// lookup; the first batch to claim it keeps its repository.
    fn assemble_batch(&self, batch: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
        if !self.scope.dedups_by_project() {
            return batch;
        }
        let mut shared = self.shared.write();
        batch
            .into_iter()
            .filter(|record| shared.seen_projects.insert(record.project_id().to_string()))
            .collect()
    }

    fn job_failed(&self, job: &LookupJob, err: anyhow::Error) {
        warn!("Lookup job on {} failed: {:#}", job.identity().uri, err);
        let failure = LookupFailure {
            identity: job.identity().clone(),
            collection: job.collection().cloned(),
            message: format!("{:#}", err),
        };
        self.shared.write().failures.push(failure);

        match self.options.failure_policy {
            FailurePolicy::FailFast => self.cancel(),
            FailurePolicy::BestEffort => debug!("Continuing lookup after failure (best-effort policy)"),
        }
    }

    /// Release one counter unit; the last release of a running lookup completes it
    pub(crate) fn finish_job(&self) {
        let mut shared = self.shared.write();
        debug_assert!(shared.outstanding > 0, "outstanding job counter underflow");
        shared.outstanding = shared.outstanding.saturating_sub(1);
        if shared.outstanding == 0 && shared.state == LookupState::Running {
            shared.state = LookupState::Completed;
            info!(
                "Lookup completed with {} results and {} failures",
                shared.results.len(),
                shared.failures.len()
            );
            self.deliver(shared, |listener| listener.on_completed());
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_and_string() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "job panicked");
    }

    #[test]
    fn test_job_accessors() {
        let identity = Identity::catalog("http://server/tfs");
        let collection = CollectionRef::new("c1", "DefaultCollection");

        let root = LookupJob::Identity(identity.clone());
        assert_eq!(root.identity(), &identity);
        assert!(root.collection().is_none());

        let leaf = LookupJob::Collection {
            identity: identity.clone(),
            collection: collection.clone(),
        };
        assert_eq!(leaf.collection(), Some(&collection));
    }
}
