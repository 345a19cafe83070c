use super::identity::{CollectionRef, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Team project that owns repositories
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

impl ProjectRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Repository as reported by a discovery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub id: String,
    pub name: String,
    pub remote_url: String,
    pub project: ProjectRef,
}

/// Leaf result of a lookup: one repository located on a server and collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub identity: Identity,
    pub collection: CollectionRef,
    pub collection_uri: String,
    pub project: ProjectRef,
    pub repository: RepositoryMetadata,
}

impl RepositoryRecord {
    pub fn new(identity: &Identity, collection: &CollectionRef, repository: RepositoryMetadata) -> Self {
        Self {
            identity: identity.clone(),
            collection: collection.clone(),
            collection_uri: identity.collection_uri(collection),
            project: repository.project.clone(),
            repository,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project.id
    }
}

impl fmt::Display for RepositoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ({})",
            self.collection.name, self.project.name, self.repository.name, self.repository.remote_url
        )
    }
}
