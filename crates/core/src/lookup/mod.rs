//! Hierarchical repository lookup.
//!
//! A [`Lookup`] fans out over its server identities (one root job each),
//! every root job schedules one job per collection it finds, and every
//! collection job publishes one batch of [`RepositoryRecord`]s. The tree grows
//! while it runs, so completion is detected with an outstanding-job counter
//! rather than by joining a known set of tasks.
//!
//! All mutable state (state machine, counter, results) sits behind a single
//! reader/writer lock. Mutations take the write lock; the guard is then
//! downgraded to a read guard before listeners are invoked, so listener code
//! never runs while a mutation is in progress and may query the lookup.
//!
//! Once the terminal notification has been delivered the lookup drops its
//! listeners and its worker pool. A listener holding a clone of its own lookup
//! therefore does not keep the lookup or the pool's threads alive.

mod job;
mod listener;
mod options;
mod pool;
mod sink;
mod state;

pub use listener::{ChannelListener, ListenerId, LookupEvent, LookupListener};
pub use options::{ExecutionMode, FailurePolicy, LookupOptions, DEFAULT_MAX_WORKERS};
pub use state::{LookupFailure, LookupState};

use crate::domain::{Identity, RepositoryRecord, Scope};
use crate::error::{LookupError, Result};
use crate::ports::Discoverers;
use job::LookupJob;
use listener::ListenerRegistry;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use pool::WorkerPool;
use state::Shared;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

thread_local! {
    /// Lookups whose listeners are being notified on this thread
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as delivering notifications for one lookup
struct DeliveryScope(usize);

impl DeliveryScope {
    fn enter(key: usize) -> Self {
        DELIVERING.with(|stack| stack.borrow_mut().push(key));
        Self(key)
    }

    fn is_active(key: usize) -> bool {
        DELIVERING.with(|stack| stack.borrow().contains(&key))
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|key| *key == self.0) {
                stack.remove(pos);
            }
        });
    }
}

pub(crate) struct Inner {
    identities: Vec<Identity>,
    scope: Scope,
    options: LookupOptions,
    discoverers: Discoverers,
    shared: RwLock<Shared>,
    listeners: ListenerRegistry,
    /// Installed by `start`, taken on the terminal transition
    pool: Mutex<Option<WorkerPool>>,
    cancel_requested: AtomicBool,
}

impl Inner {
    fn key(&self) -> usize {
        self as *const Inner as usize
    }

    fn is_delivering(&self) -> bool {
        DeliveryScope::is_active(self.key())
    }

    /// Shared view of the state; recursive so listener callbacks can query safely
    fn read(&self) -> RwLockReadGuard<'_, Shared> {
        self.shared.read_recursive()
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.read().state == LookupState::Canceled
    }

    /// Downgrade the write guard and notify every listener with it held shared.
    ///
    /// A listener panic is logged and does not reach the job or the caller.
    fn deliver<F>(&self, guard: RwLockWriteGuard<'_, Shared>, notify: F)
    where
        F: Fn(&dyn LookupListener),
    {
        let shared = RwLockWriteGuard::downgrade(guard);
        let listeners = self.listeners.snapshot();
        {
            let _scope = DeliveryScope::enter(self.key());
            for (id, listener) in listeners.iter() {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref())));
                if outcome.is_err() {
                    error!("Lookup listener {:?} panicked during notification", id);
                }
            }
        }
        drop(shared);

        if self.cancel_requested.swap(false, Ordering::SeqCst) {
            self.cancel();
        }
    }

    fn start(self: &Arc<Self>, mode: ExecutionMode) -> Result<()> {
        if self.is_delivering() {
            return Err(LookupError::AlreadyStarted {
                state: self.read().state,
            });
        }

        let mut shared = self.shared.write();
        if shared.state != LookupState::New {
            return Err(LookupError::AlreadyStarted {
                state: shared.state,
            });
        }

        let pool = match mode {
            ExecutionMode::Sync => WorkerPool::inline(),
            ExecutionMode::Async => {
                WorkerPool::threaded(self.options.pool_size(self.identities.len())).map_err(|e| {
                    LookupError::PoolUnavailable {
                        reason: e.to_string(),
                    }
                })?
            }
        };
        info!(
            "Starting lookup over {} servers (scope: {}, mode: {:?}, workers: {})",
            self.identities.len(),
            self.scope,
            mode,
            pool.size()
        );
        *self.pool.lock() = Some(pool);

        shared.state = LookupState::Running;
        // The start call itself is outstanding until every root job is scheduled
        shared.outstanding = 1;
        self.deliver(shared, |listener| listener.on_started());

        for identity in &self.identities {
            self.schedule(LookupJob::Identity(identity.clone()));
        }
        self.finish_job();
        Ok(())
    }

    pub(crate) fn cancel(&self) {
        if self.is_delivering() {
            debug!("Cancel requested from a listener; deferring until notification completes");
            self.cancel_requested.store(true, Ordering::SeqCst);
            return;
        }

        let mut shared = self.shared.write();
        if shared.state.is_terminal() {
            debug!("Cancel ignored, lookup already {}", shared.state);
            return;
        }
        info!(
            "Canceling lookup in state {} with {} jobs outstanding",
            shared.state, shared.outstanding
        );
        shared.state = LookupState::Canceled;
        self.deliver(shared, |listener| listener.on_canceled());
        self.release();
    }

    /// Drop listeners and the worker pool after the terminal notification.
    ///
    /// Queued jobs still run on the workers, see the terminal state and skip;
    /// the workers exit once the queue is drained.
    pub(crate) fn release(&self) {
        self.listeners.clear();
        if self.pool.lock().take().is_some() {
            debug!("Released lookup worker pool");
        }
    }

    /// Pool handle for dispatching one job, `None` once the lookup is terminal
    pub(crate) fn pool(&self) -> Option<WorkerPool> {
        self.pool.lock().clone()
    }
}

/// Concurrent discovery of repositories across server identities.
///
/// A lookup is single use: build it, register listeners, `start` it once and
/// drop it after `Completed` or `Canceled` has been observed. Clones share the
/// same lookup.
#[derive(Clone)]
pub struct Lookup {
    inner: Arc<Inner>,
}

impl Lookup {
    /// Create a lookup with default options
    pub fn new(identities: Vec<Identity>, scope: Scope, discoverers: Discoverers) -> Result<Self> {
        Self::builder()
            .identities(identities)
            .scope(scope)
            .discoverers(discoverers)
            .build()
    }

    pub fn builder() -> LookupBuilder {
        LookupBuilder::default()
    }

    /// Register `listener`. A terminal lookup notifies nobody, so the
    /// listener is not retained.
    pub fn add_listener(&self, listener: Arc<dyn LookupListener>) -> ListenerId {
        let shared = self.inner.read();
        if shared.state.is_terminal() {
            return self.inner.listeners.next_id();
        }
        self.inner.listeners.add(listener)
    }

    /// Returns false when `id` was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Start the lookup. Fails if it was started or canceled before.
    ///
    /// In [`ExecutionMode::Sync`] the whole tree is walked on the calling thread
    /// before this returns.
    pub fn start(&self, mode: ExecutionMode) -> Result<()> {
        self.inner.start(mode)
    }

    /// Best-effort cancellation; a no-op once the lookup is terminal
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Handle that can cancel the lookup without keeping it alive
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Accumulated records once the lookup is terminal, empty before that
    pub fn results(&self) -> Vec<RepositoryRecord> {
        let shared = self.inner.read();
        if shared.state.is_terminal() {
            shared.results.clone()
        } else {
            Vec::new()
        }
    }

    pub fn failures(&self) -> Vec<LookupFailure> {
        self.inner.read().failures.clone()
    }

    pub fn state(&self) -> LookupState {
        self.inner.read().state
    }

    pub fn outstanding_jobs(&self) -> usize {
        self.inner.read().outstanding
    }

    pub fn is_new(&self) -> bool {
        self.state() == LookupState::New
    }

    pub fn is_running(&self) -> bool {
        self.state() == LookupState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state() == LookupState::Completed
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.is_canceled()
    }

    pub fn scope(&self) -> Scope {
        self.inner.scope
    }

    pub fn identities(&self) -> &[Identity] {
        &self.inner.identities
    }

    pub fn options(&self) -> &LookupOptions {
        &self.inner.options
    }
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup")
            .field("scope", &self.inner.scope)
            .field("identities", &self.inner.identities.len())
            .field("state", &self.state())
            .finish()
    }
}

/// Weak handle for canceling a lookup, e.g. from a UI control
#[derive(Clone, Debug)]
pub struct CancelHandle {
    inner: Weak<Inner>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel();
        }
    }

    /// True when canceled or when the lookup no longer exists
    pub fn is_canceled(&self) -> bool {
        self.inner.upgrade().map_or(true, |inner| inner.is_canceled())
    }
}

/// Builder for [`Lookup`]; validates the construction contract
#[derive(Default)]
pub struct LookupBuilder {
    identities: Vec<Identity>,
    scope: Option<Scope>,
    discoverers: Option<Discoverers>,
    options: LookupOptions,
}

impl LookupBuilder {
    pub fn identities(mut self, identities: impl IntoIterator<Item = Identity>) -> Self {
        self.identities = identities.into_iter().collect();
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identities.push(identity);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn discoverers(mut self, discoverers: Discoverers) -> Self {
        self.discoverers = Some(discoverers);
        self
    }

    pub fn options(mut self, options: LookupOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Lookup> {
        if self.identities.is_empty() {
            return Err(LookupError::EmptyIdentities);
        }
        let scope = self.scope.ok_or(LookupError::MissingScope)?;
        let discoverers = self.discoverers.ok_or(LookupError::MissingDiscovery)?;
        if self.options.max_workers == 0 {
            return Err(LookupError::InvalidOptions {
                reason: "max_workers must be at least 1".to_string(),
            });
        }

        Ok(Lookup {
            inner: Arc::new(Inner {
                identities: self.identities,
                scope,
                options: self.options,
                discoverers,
                shared: RwLock::new(Shared::new()),
                listeners: ListenerRegistry::new(),
                pool: Mutex::new(None),
                cancel_requested: AtomicBool::new(false),
            }),
        })
    }
}
