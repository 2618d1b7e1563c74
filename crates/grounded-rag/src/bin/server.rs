//! Grounding server binary
//!
//! Run with: cargo run -p grounded-rag --bin grounded-rag-server

use grounded_rag::{config::RagConfig, generation::GenerationClient, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal in deployment
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Source mode: {:?}", config.sources.mode);
    tracing::info!("  - Max sources: {}", config.sources.max_sources);
    tracing::info!("  - Max PDF pages: {}", config.extraction.max_pdf_pages);
    tracing::info!("  - Workers: {}", config.aggregation.workers);
    tracing::info!("  - LLM: {:?} / {}", config.llm.backend, config.llm.model);

    // Built once; an unavailable client still lets the listener start
    let generation = GenerationClient::from_config(&config.llm);
    if !generation.is_available() {
        tracing::warn!("Serving without a generation backend; /pesquisa will return 500");
    }

    let server = RagServer::new(config, generation)?;
    tracing::info!("Health: http://{}/health", server.address());

    server.start().await?;

    Ok(())
}
