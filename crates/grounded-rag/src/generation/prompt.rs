//! Prompt templates for grounded generation

use crate::types::AggregatedContext;

/// Header opening the context block
pub const CONTEXT_HEADER: &str = "--- CONTEXT FROM SOURCES ---";

/// Header opening the question block
pub const QUESTION_HEADER: &str = "--- USER QUESTION ---";

/// Built-in grounding instruction
pub const DEFAULT_INSTRUCTION: &str = r#"You are a document-grounded assistant that ONLY uses information from the provided sources.

GROUNDING RULES:
1. ONLY use information that is EXPLICITLY stated in the CONTEXT below
2. If the answer is not in the context, say explicitly that the information is not available in the provided sources
3. NEVER use external knowledge, general knowledge, or training data
4. Whenever possible, name the source (as shown in its SOURCE banner) that contains each piece of information
5. Sources marked FETCH_ERROR, PARSE_ERROR or EMPTY_SOURCE could not be read; do not guess their content
6. Answer in the same language as the question"#;

/// Everything needed to build one prompt
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    /// Grounding instruction
    pub instruction: &'a str,
    /// Aggregated, provenance-tagged context
    pub context: &'a AggregatedContext,
    /// User question
    pub question: &'a str,
}

impl<'a> PromptRequest<'a> {
    /// Render the prompt for this request
    pub fn build(&self) -> String {
        PromptBuilder::build(self.instruction, self.context, self.question)
    }
}

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full prompt: instruction, then context in registry order,
    /// then the question
    pub fn build(instruction: &str, context: &AggregatedContext, question: &str) -> String {
        format!(
            "{instruction}\n\n{context_header}\n{context}\n\n{question_header}\n{question}",
            instruction = instruction.trim(),
            context_header = CONTEXT_HEADER,
            context = context.render(),
            question_header = QUESTION_HEADER,
            question = question
        )
    }
}
