//! PDF text extraction, page by page

use lopdf::Document;

use crate::error::ParseError;

/// Separator placed between consecutive pages
const PAGE_SEPARATOR: &str = "\n\n";

/// Typographic characters mapped to plain ASCII so downstream text stays simple
const GLYPH_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201C}', "\""),  // Left double quote
    ('\u{201D}', "\""),  // Right double quote
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Extracts text from PDF documents, reading at most `max_pages` pages
#[derive(Debug, Clone, Copy)]
pub struct PdfExtractor {
    max_pages: usize,
}

impl PdfExtractor {
    /// Create an extractor with a hard page cutoff
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Configured page cutoff
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Extract text from the first `max_pages` pages in document order.
    ///
    /// Pages without extractable text contribute an empty string; if every
    /// considered page is empty the result is `EmptyDocument`.
    pub fn extract(&self, data: &[u8]) -> Result<String, ParseError> {
        let doc = Document::load_mem(data)
            .map_err(|e| ParseError::Corrupt(format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let total_pages = pages.len();

        let texts: Vec<String> = pages
            .keys()
            .take(self.max_pages)
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => normalize_page_text(&text),
                Err(e) => {
                    tracing::debug!("No text on page {}: {}", page_number, e);
                    String::new()
                }
            })
            .collect();

        if total_pages > self.max_pages {
            tracing::debug!(
                "PDF has {} pages, read the first {}",
                total_pages,
                self.max_pages
            );
        }

        let content = texts.join(PAGE_SEPARATOR);
        if content.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        Ok(content)
    }
}

/// Strip NUL characters, map glyphs to ASCII, drop blank lines
fn normalize_page_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\0' {
            continue;
        }
        match GLYPH_REPLACEMENTS.iter().find(|(glyph, _)| *glyph == c) {
            Some((_, replacement)) => cleaned.push_str(replacement),
            None => cleaned.push(c),
        }
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
