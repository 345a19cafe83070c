use anyhow::{Context, Result};
use repo_lookup_core::{
    ChannelListener, Discoverers, Lookup, LookupEvent, LookupFailure, LookupState, RepositoryRecord,
};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::{Catalog, CatalogDiscovery};
use crate::config::Config;

/// Outcome of one lookup run
#[derive(Debug)]
pub struct LookupSummary {
    pub state: LookupState,
    pub results: Vec<RepositoryRecord>,
    pub failures: Vec<LookupFailure>,
}

impl LookupSummary {
    pub fn is_complete(&self) -> bool {
        self.state == LookupState::Completed
    }
}

/// Run a lookup over every server in `catalog`, printing records to `out` as batches arrive
pub fn run_lookup<W: Write>(config: &Config, catalog: Catalog, out: &mut W) -> Result<LookupSummary> {
    let identities = catalog.identities();
    info!("Looking up repositories on {} servers", identities.len());

    let discoverers = Discoverers::uniform(Arc::new(CatalogDiscovery::new(catalog)));
    let lookup = Lookup::builder()
        .identities(identities)
        .scope(config.lookup.scope)
        .discoverers(discoverers)
        .options(config.lookup.options())
        .build()
        .context("Invalid lookup configuration")?;

    let (listener, events) = ChannelListener::new();
    let listener_id = lookup.add_listener(listener);

    lookup
        .start(config.lookup.mode())
        .context("Failed to start lookup")?;

    while let Ok(event) = events.recv() {
        match event {
            LookupEvent::Started => debug!("Lookup started"),
            LookupEvent::PartialResults(batch) => {
                for record in &batch {
                    writeln!(out, "{record}").context("Failed to write result")?;
                }
            }
            LookupEvent::Completed | LookupEvent::Canceled => break,
        }
    }
    lookup.remove_listener(listener_id);

    let failures = lookup.failures();
    for failure in &failures {
        warn!("{failure}");
    }

    let summary = LookupSummary {
        state: lookup.state(),
        results: lookup.results(),
        failures,
    };
    info!(
        "Lookup finished as {} with {} repositories",
        summary.state,
        summary.results.len()
    );
    Ok(summary)
}
