use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use travel_adviser::api::AppState;
use travel_adviser::config::{AdviserConfig, StoreBackend, StoreConfig};
use travel_adviser::llm::{LanguageModel, OpenAiChatClient};
use travel_adviser::store::{CatalogStore, InMemoryCatalog, Neo4jHttpStore};
use travel_adviser::{RetrievalOrchestrator, logging, web};

fn build_store(config: &StoreConfig) -> Result<Arc<dyn CatalogStore>> {
    let store: Arc<dyn CatalogStore> = match config.backend {
        StoreBackend::Neo4j => Arc::new(Neo4jHttpStore::new(config)?),
        StoreBackend::Memory => {
            let path = config
                .catalog_path
                .as_deref()
                .context("store.catalog_path is required for the memory backend")?;
            Arc::new(
                InMemoryCatalog::load(path)
                    .with_context(|| format!("Failed to load catalog from {path}"))?,
            )
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AdviserConfig::load_from_path(config_path)?;
    logging::init(&config.logging)?;

    info!(
        "Starting travel-adviser {} with {:?} store and model {}",
        travel_adviser::VERSION,
        config.store.backend,
        config.llm.model
    );

    let store = build_store(&config.store)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiChatClient::new(&config.llm)?);
    let orchestrator = Arc::new(RetrievalOrchestrator::from_config(
        Arc::clone(&store),
        Arc::clone(&llm),
        &config.retrieval,
    ));

    web::run(&config.server, AppState::new(orchestrator, llm, store)).await
}
