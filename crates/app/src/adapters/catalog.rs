use anyhow::{bail, Context, Result};
use repo_lookup_core::domain::{CollectionRef, Identity, ProjectRef, RepositoryMetadata, ServerKind};
use repo_lookup_core::ports::DiscoveryPort;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Static description of servers, collections and repositories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub uri: String,
    pub kind: ServerKind,
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    pub id: Option<String>,
    /// Collection answers 503: it is reported as empty and the lookup moves on
    #[serde(default)]
    pub unavailable: bool,
    /// Listing repositories fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub id: Option<String>,
    pub remote_url: String,
    pub project: String,
    pub project_id: Option<String>,
}

impl CollectionEntry {
    fn to_ref(&self) -> CollectionRef {
        CollectionRef::new(self.id.clone().unwrap_or_else(|| self.name.clone()), self.name.clone())
    }
}

impl RepositoryEntry {
    fn to_metadata(&self) -> RepositoryMetadata {
        RepositoryMetadata {
            id: self.id.clone().unwrap_or_else(|| self.name.clone()),
            name: self.name.clone(),
            remote_url: self.remote_url.clone(),
            project: ProjectRef::new(
                self.project_id.clone().unwrap_or_else(|| self.project.clone()),
                self.project.clone(),
            ),
        }
    }
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        contents
            .parse::<Catalog>()
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))
    }

    /// One identity per server, in file order
    pub fn identities(&self) -> Vec<Identity> {
        self.servers
            .iter()
            .map(|server| Identity::new(server.uri.clone(), server.kind))
            .collect()
    }

    fn server(&self, identity: &Identity) -> Option<&ServerEntry> {
        let key = identity.key();
        self.servers.iter().find(|server| {
            server.kind == identity.kind && Identity::new(server.uri.clone(), server.kind).key() == key
        })
    }
}

impl std::str::FromStr for Catalog {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid catalog TOML")
    }
}

/// Discovery adapter answering from a [`Catalog`]
pub struct CatalogDiscovery {
    catalog: Catalog,
}

impl CatalogDiscovery {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl DiscoveryPort for CatalogDiscovery {
    fn list_collections(&self, identity: &Identity) -> Result<Vec<CollectionRef>> {
        let Some(server) = self.catalog.server(identity) else {
            bail!("Server {} is not in the catalog", identity.uri);
        };
        debug!("Catalog lists {} collections for {}", server.collections.len(), identity.uri);
        Ok(server.collections.iter().map(CollectionEntry::to_ref).collect())
    }

    fn list_repositories(
        &self,
        identity: &Identity,
        collection: &CollectionRef,
    ) -> Result<Vec<RepositoryMetadata>> {
        let Some(server) = self.catalog.server(identity) else {
            bail!("Server {} is not in the catalog", identity.uri);
        };
        let Some(entry) = server.collections.iter().find(|c| c.name == collection.name) else {
            bail!("Collection {} not found on {}", collection.name, identity.uri);
        };
        if entry.unavailable {
            warn!("Collection {} on {} is unavailable", collection.name, identity.uri);
            return Ok(Vec::new());
        }
        if let Some(message) = &entry.error {
            bail!("{}", message);
        }
        Ok(entry.repositories.iter().map(RepositoryEntry::to_metadata).collect())
    }
}
