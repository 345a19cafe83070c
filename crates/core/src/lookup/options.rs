use serde::{Deserialize, Serialize};

/// Upper bound on worker threads used by an asynchronous lookup.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// What a failing job does to the rest of the lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Any failing job cancels the whole lookup
    #[default]
    FailFast,
    /// Failures are recorded and the remaining jobs keep running
    BestEffort,
}

/// How `Lookup::start` executes jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Every job runs inline on the calling thread; `start` returns once the tree is walked
    Sync,
    /// Jobs are queued to a bounded worker pool; `start` returns immediately
    Async,
}

/// Tuning for a lookup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupOptions {
    /// Maximum number of worker threads in asynchronous mode.
    pub max_workers: usize,
    /// Reaction to failing discovery jobs.
    pub failure_policy: FailurePolicy,
}

impl LookupOptions {
    /// Set the worker cap.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Worker count for a lookup over `identities` servers
    pub fn pool_size(&self, identities: usize) -> usize {
        identities.min(self.max_workers).max(1)
    }
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            failure_policy: FailurePolicy::default(),
        }
    }
}
