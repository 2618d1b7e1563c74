//! LLM backends behind a common provider trait
//!
//! Gemini is the default hosted backend; Ollama serves local development.

pub mod gemini;
pub mod llm;
pub mod ollama;

pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use ollama::OllamaClient;
