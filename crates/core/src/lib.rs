//! repo-lookup core - concurrent repository discovery engine
//!
//! This crate contains the domain types, the discovery port (interface) and
//! the lookup engine that fans out over server identities, their collections
//! and their repositories. It performs no I/O of its own; talking to servers
//! is the job of `DiscoveryPort` adapters.

pub mod domain;
pub mod error;
pub mod lookup;
pub mod ports;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
pub use lookup::{
    CancelHandle, ChannelListener, ExecutionMode, FailurePolicy, ListenerId, Lookup, LookupBuilder,
    LookupEvent, LookupFailure, LookupListener, LookupOptions, LookupState, DEFAULT_MAX_WORKERS,
};
pub use ports::{Discoverers, DiscoveryPort};
