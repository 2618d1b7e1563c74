//! Source descriptors: which documents to consult and how to read them

use serde::{Deserialize, Serialize};
use url::Url;

/// Supported source kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Web page
    Html,
    /// Remotely hosted PDF document
    Pdf,
}

impl SourceKind {
    /// Parse a kind label as found in manifests (`pdf`, `html`, `page`, ...)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "pdf" | "document" => Some(Self::Pdf),
            "html" | "htm" | "page" | "web" => Some(Self::Html),
            _ => None,
        }
    }

    /// Infer the kind from a URL path (`.pdf` suffix means PDF)
    pub fn infer(locator: &Url) -> Self {
        if locator.path().to_lowercase().ends_with(".pdf") {
            Self::Pdf
        } else {
            Self::Html
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Pdf => "PDF",
        }
    }
}

/// One document to consult. Order in the registry is significant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Identifier shown in provenance banners
    pub id: String,
    /// Absolute location
    pub locator: Url,
    /// Extraction strategy
    pub kind: SourceKind,
}

impl SourceDescriptor {
    /// Create a descriptor
    pub fn new(id: impl Into<String>, locator: Url, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            locator,
            kind,
        }
    }
}
