//! Provenance-tagged context assembled from all sources

use serde::{Deserialize, Serialize};

use crate::types::{ExtractionResult, ExtractionStatus, SourceDescriptor};

/// One source's contribution, framed by its provenance banner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    /// Source identity
    pub source_id: String,
    /// Banner identifying the origin, placed before the text
    pub banner: String,
    /// Extracted text, or a failure marker
    pub text: String,
    /// Outcome category of the extraction
    pub status: ExtractionStatus,
}

impl ContextEntry {
    /// Frame an extraction result for the source at `index` (0-based)
    pub fn new(index: usize, source: &SourceDescriptor, result: &ExtractionResult) -> Self {
        Self {
            source_id: source.id.clone(),
            banner: Self::banner(index, source),
            text: result.contribution(),
            status: result.status,
        }
    }

    fn banner(index: usize, source: &SourceDescriptor) -> String {
        format!(
            "--- SOURCE {}: {} ({}, {}) ---",
            index + 1,
            source.id,
            source.kind.display_name(),
            source.locator
        )
    }
}

/// Count and size summary of an aggregated context
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextSummary {
    /// Sources consulted
    pub sources: usize,
    /// Sources that yielded text
    pub succeeded: usize,
    /// Sources represented by a marker
    pub failed: usize,
    /// Characters of text across all entries (banners excluded)
    pub total_chars: usize,
}

/// Ordered entries, exactly one per consulted source, in registry order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregatedContext {
    entries: Vec<ContextEntry>,
}

impl AggregatedContext {
    /// Build from descriptors and their results, paired by position
    pub fn from_results(
        sources: &[SourceDescriptor],
        results: &[ExtractionResult],
        max_chars_per_source: Option<usize>,
    ) -> Self {
        debug_assert_eq!(sources.len(), results.len());

        let entries = sources
            .iter()
            .zip(results)
            .enumerate()
            .map(|(index, (source, result))| {
                let mut entry = ContextEntry::new(index, source, result);
                if let (Some(max), ExtractionStatus::Ok) = (max_chars_per_source, entry.status) {
                    entry.text = truncate_text(&entry.text, max);
                }
                entry
            })
            .collect();

        Self { entries }
    }

    /// Entries in registry order
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no source was consulted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count and size summary
    pub fn summary(&self) -> ContextSummary {
        let succeeded = self
            .entries
            .iter()
            .filter(|e| e.status == ExtractionStatus::Ok)
            .count();

        ContextSummary {
            sources: self.entries.len(),
            succeeded,
            failed: self.entries.len() - succeeded,
            total_chars: self.entries.iter().map(|e| e.text.chars().count()).sum(),
        }
    }

    /// Serialize as banner + text blocks, in registry order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\n\n{}", e.banner, e.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Truncate to `max_chars` characters, preserving word boundaries
fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::types::SourceKind;
    use url::Url;

    fn sources() -> Vec<SourceDescriptor> {
        vec![
            SourceDescriptor::new("a", Url::parse("https://a.example/").unwrap(), SourceKind::Html),
            SourceDescriptor::new("b", Url::parse("https://b.example/doc.pdf").unwrap(), SourceKind::Pdf),
        ]
    }

    #[test]
    fn test_one_entry_per_source_in_order() {
        let sources = sources();
        let results = vec![
            ExtractionResult::fetch_failed(&sources[0], &FetchError::Timeout),
            ExtractionResult::ok(&sources[1], "page one".to_string()),
        ];

        let context = AggregatedContext::from_results(&sources, &results, None);
        assert_eq!(context.len(), 2);
        assert_eq!(context.entries()[0].source_id, "a");
        assert_eq!(context.entries()[1].source_id, "b");
        assert!(context.entries()[0].text.contains("FETCH_ERROR"));

        let summary = context.summary();
        assert_eq!(summary.sources, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_render_banner_before_text() {
        let sources = sources();
        let results = vec![
            ExtractionResult::ok(&sources[0], "alpha".to_string()),
            ExtractionResult::ok(&sources[1], "beta".to_string()),
        ];

        let rendered = AggregatedContext::from_results(&sources, &results, None).render();
        let banner_a = rendered.find("--- SOURCE 1: a").unwrap();
        let alpha = rendered.find("alpha").unwrap();
        let banner_b = rendered.find("--- SOURCE 2: b").unwrap();
        let beta = rendered.find("beta").unwrap();
        assert!(banner_a < alpha && alpha < banner_b && banner_b < beta);
        assert!(rendered.contains("https://b.example/doc.pdf"));
    }

    #[test]
    fn test_truncation_applies_to_text_only() {
        let sources = sources();
        let results = vec![
            ExtractionResult::ok(&sources[0], "one two three four".to_string()),
            ExtractionResult::fetch_failed(&sources[1], &FetchError::Network("refused".into())),
        ];

        let context = AggregatedContext::from_results(&sources, &results, Some(9));
        assert_eq!(context.entries()[0].text, "one two...");
        assert!(context.entries()[1].text.contains("refused"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_text("conteúdo extraído", 8), "conteúdo...");
        assert_eq!(truncate_text("curto", 10), "curto");
    }
}
