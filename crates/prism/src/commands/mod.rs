//! CLI command handlers.

pub mod ask;
pub mod chat;
pub mod image;
pub mod records;
pub mod repl;
pub mod speak;
pub mod video;

use std::sync::Arc;

use anyhow::Result;

use prism_config::PrismConfig;
use prism_gemini::{GeminiClient, GeminiConfig, SharedGateway};
use prism_store::RecordStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved application configuration.
    pub config: PrismConfig,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Build a gateway from the resolved configuration.
    pub fn gateway(&self) -> Result<SharedGateway> {
        let client = GeminiClient::new(GeminiConfig::from_config(&self.config)?)?;
        Ok(Arc::new(client))
    }

    /// Open the record store at its resolved path.
    pub fn store(&self) -> Arc<RecordStore> {
        Arc::new(RecordStore::open(self.config.resolve_store_path()))
    }
}
