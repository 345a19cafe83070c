//! Scripted in-memory discovery used by the lookup tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use repo_lookup_core::{
    CollectionRef, DiscoveryPort, Identity, LookupEvent, ProjectRef, RepositoryMetadata,
};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

pub fn repo(name: &str, project_id: &str) -> RepositoryMetadata {
    RepositoryMetadata {
        id: format!("id-{}", name),
        name: name.to_string(),
        remote_url: format!("http://server/_git/{}", name),
        project: ProjectRef::new(project_id, format!("Project {}", project_id)),
    }
}

/// Discovery port answering from a fixed tree of servers and collections
#[derive(Default)]
pub struct ScriptedDiscovery {
    servers: HashMap<String, Vec<(CollectionRef, Vec<RepositoryMetadata>)>>,
    failing_servers: HashSet<String>,
    failing_collections: HashSet<(String, String)>,
    panicking_collections: HashSet<(String, String)>,
    gate: Option<Receiver<()>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, uri: &str, name: &str, repos: Vec<RepositoryMetadata>) -> Self {
        self.servers
            .entry(uri.to_string())
            .or_default()
            .push((CollectionRef::new(format!("id-{}", name), name), repos));
        self
    }

    pub fn failing_server(mut self, uri: &str) -> Self {
        self.failing_servers.insert(uri.to_string());
        self
    }

    pub fn failing_collection(mut self, uri: &str, name: &str) -> Self {
        self.failing_collections.insert((uri.to_string(), name.to_string()));
        self
    }

    pub fn panicking_collection(mut self, uri: &str, name: &str) -> Self {
        self.panicking_collections.insert((uri.to_string(), name.to_string()));
        self
    }

    /// Block every `list_collections` call until the returned sender releases it
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (release, gate) = bounded(64);
        self.gate = Some(gate);
        (self, release)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl DiscoveryPort for ScriptedDiscovery {
    fn list_collections(&self, identity: &Identity) -> Result<Vec<CollectionRef>> {
        self.calls.lock().push(format!("collections:{}", identity.uri));
        if let Some(gate) = &self.gate {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        if self.failing_servers.contains(&identity.uri) {
            bail!("server {} refused the connection", identity.uri);
        }
        Ok(self
            .servers
            .get(&identity.uri)
            .map(|collections| collections.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default())
    }

    fn list_repositories(
        &self,
        identity: &Identity,
        collection: &CollectionRef,
    ) -> Result<Vec<RepositoryMetadata>> {
        self.calls
            .lock()
            .push(format!("repositories:{}/{}", identity.uri, collection.name));
        let key = (identity.uri.clone(), collection.name.clone());
        if self.panicking_collections.contains(&key) {
            panic!("collection {} blew up", collection.name);
        }
        if self.failing_collections.contains(&key) {
            bail!("collection {} is unavailable", collection.name);
        }
        Ok(self
            .servers
            .get(&identity.uri)
            .and_then(|collections| collections.iter().find(|(c, _)| c == collection))
            .map(|(_, repos)| repos.clone())
            .unwrap_or_default())
    }
}

/// Compact names for event sequences: `started`, `results:a,b`, `completed`, `canceled`
pub fn describe(events: &[LookupEvent]) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            LookupEvent::Started => "started".to_string(),
            LookupEvent::PartialResults(batch) => format!(
                "results:{}",
                batch
                    .iter()
                    .map(|r| r.repository.name.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            LookupEvent::Completed => "completed".to_string(),
            LookupEvent::Canceled => "canceled".to_string(),
        })
        .collect()
}

/// Receive events until a terminal one arrives
pub fn collect_until_terminal(events: &Receiver<LookupEvent>, timeout: Duration) -> Vec<LookupEvent> {
    let deadline = Instant::now() + timeout;
    let mut received = Vec::new();
    while let Ok(event) = events.recv_deadline(deadline) {
        let terminal = event.is_terminal();
        received.push(event);
        if terminal {
            break;
        }
    }
    received
}

pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
