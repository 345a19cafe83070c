use crate::domain::{CollectionRef, Identity, RepositoryRecord};
use std::collections::HashSet;
use std::fmt;

/// Lifecycle of a lookup: `New -> Running -> {Completed, Canceled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupState {
    New,
    Running,
    Completed,
    Canceled,
}

impl LookupState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LookupState::Completed | LookupState::Canceled)
    }
}

impl fmt::Display for LookupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupState::New => "NEW",
            LookupState::Running => "RUNNING",
            LookupState::Completed => "COMPLETED",
            LookupState::Canceled => "CANCELED",
        };
        write!(f, "{}", name)
    }
}

/// A job that failed with an error or a panic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub identity: Identity,
    /// `None` when listing the server's collections failed
    pub collection: Option<CollectionRef>,
    pub message: String,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.collection {
            Some(collection) => write!(f, "{} [{}]: {}", self.identity.uri, collection.name, self.message),
            None => write!(f, "{}: {}", self.identity.uri, self.message),
        }
    }
}

/// Mutable state of a lookup, guarded by the coordinator's reader/writer lock
#[derive(Debug)]
pub(crate) struct Shared {
    pub state: LookupState,
    /// Scheduled jobs that have not finished yet (the start call holds one unit while scheduling roots)
    pub outstanding: usize,
    pub results: Vec<RepositoryRecord>,
    /// Project ids already claimed under `Scope::Project`
    pub seen_projects: HashSet<String>,
    pub failures: Vec<LookupFailure>,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            state: LookupState::New,
            outstanding: 0,
            results: Vec::new(),
            seen_projects: HashSet::new(),
            failures: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LookupState::New.is_terminal());
        assert!(!LookupState::Running.is_terminal());
        assert!(LookupState::Completed.is_terminal());
        assert!(LookupState::Canceled.is_terminal());
    }

    #[test]
    fn test_failure_display_names_collection() {
        let failure = LookupFailure {
            identity: Identity::catalog("http://server/tfs"),
            collection: Some(CollectionRef::new("c1", "Archive")),
            message: "collection unavailable".to_string(),
        };
        assert_eq!(failure.to_string(), "http://server/tfs [Archive]: collection unavailable");
    }

    #[test]
    fn test_new_shared_state() {
        let shared = Shared::new();
        assert_eq!(shared.state, LookupState::New);
        assert_eq!(shared.outstanding, 0);
        assert!(shared.results.is_empty());
    }
}
