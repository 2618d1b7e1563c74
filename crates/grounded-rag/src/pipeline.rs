//! Request pipeline: registry → aggregator → prompt → generation

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{GenerationClient, PromptBuilder, DEFAULT_INSTRUCTION};
use crate::ingestion::{Aggregator, AggregatorConfig, Fetcher, HttpFetcher, SourceRegistry};

/// Answers one question from freshly fetched sources.
///
/// Holds no per-request state; the generation client is the only shared handle.
pub struct Pipeline {
    registry: SourceRegistry,
    aggregator: Aggregator,
    instruction: String,
    generation: Arc<GenerationClient>,
}

impl Pipeline {
    /// Assemble a pipeline from its parts
    pub fn new(
        registry: SourceRegistry,
        aggregator: Aggregator,
        instruction: impl Into<String>,
        generation: Arc<GenerationClient>,
    ) -> Self {
        Self {
            registry,
            aggregator,
            instruction: instruction.into(),
            generation,
        }
    }

    /// Build from configuration with the HTTP fetcher
    pub fn from_config(config: &RagConfig, generation: Arc<GenerationClient>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
        Self::with_fetcher(config, fetcher, generation)
    }

    /// Build from configuration around a given fetcher
    pub fn with_fetcher(
        config: &RagConfig,
        fetcher: Arc<dyn Fetcher>,
        generation: Arc<GenerationClient>,
    ) -> Result<Self> {
        let registry = SourceRegistry::from_config(&config.sources)?;
        let aggregator = Aggregator::new(fetcher, AggregatorConfig::from_config(config));
        let instruction = config
            .prompt
            .instruction
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string());

        Ok(Self::new(registry, aggregator, instruction, generation))
    }

    /// Generation client shared by all requests
    pub fn generation(&self) -> &GenerationClient {
        &self.generation
    }

    /// Answer `question` from the configured sources
    pub async fn answer(&self, question: &str) -> Result<String> {
        // Nothing to gain from fetching if no answer can be generated
        self.generation.ensure_available()?;

        let sources = self.registry.resolve()?;
        tracing::info!("Consulting {} sources", sources.len());

        let start = Instant::now();
        let context = self.aggregator.aggregate(&sources).await;
        let summary = context.summary();
        tracing::info!(
            sources = summary.sources,
            succeeded = summary.succeeded,
            failed = summary.failed,
            total_chars = summary.total_chars,
            "Context assembled in {} ms",
            start.elapsed().as_millis()
        );

        let prompt = PromptBuilder::build(&self.instruction, &context, question);

        let start = Instant::now();
        let response = self.generation.respond(&prompt).await;
        if let Some(detail) = response.detail.as_deref().filter(|_| !response.is_ok()) {
            tracing::error!(status = ?response.status, "Generation failed: {}", detail);
        } else {
            tracing::info!("Generated answer in {} ms", start.elapsed().as_millis());
        }

        Ok(response.into_result()?)
    }
}
