//! Core types for the grounding pipeline

pub mod context;
pub mod extraction;
pub mod query;
pub mod response;
pub mod source;

pub use context::{AggregatedContext, ContextEntry, ContextSummary};
pub use extraction::{ExtractionResult, ExtractionStatus};
pub use query::{PesquisaRequest, PesquisaResponse};
pub use response::{GenerationResponse, GenerationStatus};
pub use source::{SourceDescriptor, SourceKind};
