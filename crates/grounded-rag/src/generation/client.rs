//! Generation client: a provider handle whose availability is fixed at startup

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::GenerationError;
use crate::providers::{GeminiClient, LlmProvider, OllamaClient};
use crate::types::GenerationResponse;

/// Shared generation handle.
///
/// Built once per process. If construction failed, the handle stays
/// unavailable for its whole lifetime and every call reports
/// `ClientUnavailable` without retrying initialization.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Option<Arc<dyn LlmProvider>>,
    unavailable_reason: String,
}

impl GenerationClient {
    /// Build from configuration, resolving the credential from the process environment
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    fn from_config_with(config: &LlmConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider: crate::Result<Arc<dyn LlmProvider>> = match config.backend {
            LlmBackend::Gemini => match lookup(&config.api_key_env).filter(|key| !key.trim().is_empty()) {
                Some(key) => GeminiClient::new(config, key.trim()).map(|c| Arc::new(c) as Arc<dyn LlmProvider>),
                None => {
                    let reason = format!("environment variable {} is not set", config.api_key_env);
                    tracing::error!("Generation client unavailable: {}", reason);
                    return Self::unavailable(reason);
                }
            },
            LlmBackend::Ollama => OllamaClient::new(config).map(|c| Arc::new(c) as Arc<dyn LlmProvider>),
        };

        match provider {
            Ok(provider) => {
                tracing::info!(
                    "Generation client ready: {} ({})",
                    provider.name(),
                    provider.model()
                );
                Self::with_provider(provider)
            }
            Err(e) => {
                tracing::error!("Generation client unavailable: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Wrap an already constructed provider
    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
            unavailable_reason: String::new(),
        }
    }

    /// A client that failed to initialize
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            provider: None,
            unavailable_reason: reason.into(),
        }
    }

    /// Whether initialization succeeded
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Fail with `ClientUnavailable` if initialization did not succeed
    pub fn ensure_available(&self) -> Result<(), GenerationError> {
        self.provider().map(|_| ())
    }

    fn provider(&self) -> Result<&Arc<dyn LlmProvider>, GenerationError> {
        self.provider
            .as_ref()
            .ok_or_else(|| GenerationError::ClientUnavailable(self.unavailable_reason.clone()))
    }

    /// Provider name, if available
    pub fn name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    /// Send the prompt to the backend
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let provider = self.provider()?;

        tracing::debug!(
            "Generating with {} ({}), prompt {} chars",
            provider.name(),
            provider.model(),
            prompt.len()
        );

        provider
            .generate(prompt)
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))
    }

    /// `generate` wrapped into a loggable record
    pub async fn respond(&self, prompt: &str) -> GenerationResponse {
        GenerationResponse::from(self.generate(prompt).await)
    }
}
