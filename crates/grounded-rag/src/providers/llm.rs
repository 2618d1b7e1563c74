//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Backend that turns a finished prompt into answer text
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-2.5-flash)
/// - `OllamaClient`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the generated text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
