//! Application state for the grounding server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::pipeline::Pipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Question-answering pipeline
    pipeline: Pipeline,
}

impl AppState {
    /// Create application state around a ready pipeline
    pub fn new(config: RagConfig, pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Ready when the generation client initialized
    pub fn is_ready(&self) -> bool {
        self.inner.pipeline.generation().is_available()
    }
}
