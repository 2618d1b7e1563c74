//! grounded-rag: question answering grounded in a fixed set of fetched documents
//!
//! Each request resolves a bounded list of web pages and PDF documents, fetches
//! and extracts them with per-source failure isolation, assembles a
//! provenance-tagged context and asks a generative model to answer only from it.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use types::{
    AggregatedContext, ExtractionResult, PesquisaRequest, PesquisaResponse, SourceDescriptor,
    SourceKind,
};
