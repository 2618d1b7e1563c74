//! Grounded prompt construction and answer generation

pub mod client;
pub mod prompt;

pub use client::GenerationClient;
pub use prompt::{PromptBuilder, PromptRequest, DEFAULT_INSTRUCTION};
