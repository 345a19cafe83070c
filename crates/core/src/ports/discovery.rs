use crate::domain::{CollectionRef, Identity, RepositoryMetadata, ServerKind};
use anyhow::Result;
use std::sync::Arc;

/// Port for remote repository discovery
///
/// Implementations may be called concurrently from several lookup jobs.
pub trait DiscoveryPort: Send + Sync {
    /// List the collections hosted by the server behind `identity`.
    /// This is blocking - it runs on a lookup worker
    fn list_collections(&self, identity: &Identity) -> Result<Vec<CollectionRef>>;

    /// List the repositories inside one collection
    fn list_repositories(
        &self,
        identity: &Identity,
        collection: &CollectionRef,
    ) -> Result<Vec<RepositoryMetadata>>;
}

/// Discovery collaborators, one per server kind
#[derive(Clone)]
pub struct Discoverers {
    catalog: Arc<dyn DiscoveryPort>,
    rest: Arc<dyn DiscoveryPort>,
}

impl Discoverers {
    pub fn new(catalog: Arc<dyn DiscoveryPort>, rest: Arc<dyn DiscoveryPort>) -> Self {
        Self { catalog, rest }
    }

    /// Use the same port for every server kind
    pub fn uniform(port: Arc<dyn DiscoveryPort>) -> Self {
        Self {
            catalog: Arc::clone(&port),
            rest: port,
        }
    }

    pub fn for_kind(&self, kind: ServerKind) -> &dyn DiscoveryPort {
        match kind {
            ServerKind::Catalog => self.catalog.as_ref(),
            ServerKind::Rest => self.rest.as_ref(),
        }
    }

    pub fn for_identity(&self, identity: &Identity) -> &dyn DiscoveryPort {
        self.for_kind(identity.kind)
    }
}

impl std::fmt::Debug for Discoverers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discoverers").finish_non_exhaustive()
    }
}
