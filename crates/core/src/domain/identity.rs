use serde::{Deserialize, Serialize};
use std::fmt;

/// Flavor of server an identity points at; selects the discovery collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// On-premises server that lists collections through its SOAP catalog service
    Catalog,
    /// Hosted server reached through the REST API
    Rest,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Catalog => write!(f, "catalog"),
            ServerKind::Rest => write!(f, "rest"),
        }
    }
}

/// Authenticated handle to one remote server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uri: String,
    pub kind: ServerKind,
}

impl Identity {
    pub fn new(uri: impl Into<String>, kind: ServerKind) -> Self {
        Self {
            uri: uri.into(),
            kind,
        }
    }

    pub fn catalog(uri: impl Into<String>) -> Self {
        Self::new(uri, ServerKind::Catalog)
    }

    pub fn rest(uri: impl Into<String>) -> Self {
        Self::new(uri, ServerKind::Rest)
    }

    /// Normalized key for the server: case, scheme and trailing slashes are ignored
    pub fn key(&self) -> String {
        let without_scheme = match self.uri.split_once("://") {
            Some((_, rest)) => rest,
            None => self.uri.as_str(),
        };
        without_scheme.trim_end_matches('/').to_lowercase()
    }

    /// URI used to address `collection` on this server.
    ///
    /// Hosted servers address the collection through the account URI itself,
    /// catalog servers nest it one path segment below the server URI.
    pub fn collection_uri(&self, collection: &CollectionRef) -> String {
        match self.kind {
            ServerKind::Rest => self.uri.clone(),
            ServerKind::Catalog => format!(
                "{}/{}",
                self.uri.trim_end_matches('/'),
                collection.name.trim_start_matches('/')
            ),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uri, self.kind)
    }
}

/// A team project collection on one server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: String,
    pub name: String,
}

impl CollectionRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_ignores_scheme_case_and_trailing_slash() {
        let a = Identity::catalog("http://Server:8080/tfs/");
        let b = Identity::catalog("https://server:8080/TFS");
        assert_eq!(a.key(), "server:8080/tfs");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_identity_key_without_scheme() {
        let id = Identity::rest("Account.example.com");
        assert_eq!(id.key(), "account.example.com");
    }

    #[test]
    fn test_collection_uri_for_catalog_server() {
        let id = Identity::catalog("http://server:8080/tfs/");
        let collection = CollectionRef::new("c1", "DefaultCollection");
        assert_eq!(
            id.collection_uri(&collection),
            "http://server:8080/tfs/DefaultCollection"
        );
    }

    #[test]
    fn test_collection_uri_for_rest_server_is_account_uri() {
        let id = Identity::rest("https://account.example.com");
        let collection = CollectionRef::new("c1", "account");
        assert_eq!(id.collection_uri(&collection), "https://account.example.com");
    }

    #[test]
    fn test_identity_display() {
        let id = Identity::rest("https://account.example.com");
        assert_eq!(id.to_string(), "https://account.example.com (rest)");
    }
}
