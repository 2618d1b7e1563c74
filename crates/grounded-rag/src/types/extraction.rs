//! Per-source extraction outcome

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, ParseError};
use crate::types::SourceDescriptor;

/// Outcome category for one source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Text extracted
    Ok,
    /// Source could not be retrieved
    FetchError,
    /// Source was retrieved but could not be parsed
    ParseError,
    /// Source parsed but held no text
    Empty,
}

/// Result of fetching and extracting one source.
///
/// Produced fresh per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Source identity
    pub source_id: String,
    /// Outcome category
    pub status: ExtractionStatus,
    /// Extracted text (empty unless `status` is `Ok`)
    pub text: String,
    /// Error kind and message for failed sources
    pub detail: Option<String>,
}

impl ExtractionResult {
    /// Successful extraction. Whitespace-only text is reported as `Empty`.
    pub fn ok(source: &SourceDescriptor, text: String) -> Self {
        if text.trim().is_empty() {
            return Self::empty(source);
        }
        Self {
            source_id: source.id.clone(),
            status: ExtractionStatus::Ok,
            text,
            detail: None,
        }
    }

    /// Source could not be retrieved
    pub fn fetch_failed(source: &SourceDescriptor, err: &FetchError) -> Self {
        Self {
            source_id: source.id.clone(),
            status: ExtractionStatus::FetchError,
            text: String::new(),
            detail: Some(format!("{}: {}", err.kind(), err)),
        }
    }

    /// Source could not be parsed
    pub fn parse_failed(source: &SourceDescriptor, err: &ParseError) -> Self {
        match err {
            ParseError::EmptyDocument => Self::empty(source),
            ParseError::Corrupt(_) => Self {
                source_id: source.id.clone(),
                status: ExtractionStatus::ParseError,
                text: String::new(),
                detail: Some(format!("{}: {}", err.kind(), err)),
            },
        }
    }

    /// Source yielded no text
    pub fn empty(source: &SourceDescriptor) -> Self {
        Self {
            source_id: source.id.clone(),
            status: ExtractionStatus::Empty,
            text: String::new(),
            detail: Some(format!("{}: {}", ParseError::EmptyDocument.kind(), ParseError::EmptyDocument)),
        }
    }

    /// Whether text was extracted
    pub fn is_ok(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }

    /// Text contributed to the context: the extracted text, or a marker
    /// naming the source and the error kind
    pub fn contribution(&self) -> String {
        let tag = match self.status {
            ExtractionStatus::Ok => return self.text.clone(),
            ExtractionStatus::FetchError => "FETCH_ERROR",
            ExtractionStatus::ParseError => "PARSE_ERROR",
            ExtractionStatus::Empty => "EMPTY_SOURCE",
        };
        format!(
            "[{}] source '{}' could not be read ({})",
            tag,
            self.source_id,
            self.detail.as_deref().unwrap_or("no detail")
        )
    }
}
