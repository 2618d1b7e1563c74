//! HTML text extraction

use scraper::{ElementRef, Html, Node};

/// Elements whose whole subtree is dropped before text extraction
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Extracts visible text from web pages.
///
/// Parsing is lenient: malformed markup degrades to best-effort text, never an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Extract whitespace-normalized visible text
    pub fn extract(&self, data: &[u8]) -> String {
        let html = String::from_utf8_lossy(data);
        let document = Html::parse_document(&html);

        let mut fragments = Vec::new();
        collect_text(document.root_element(), &mut fragments);

        clean_text(&fragments.join(" "))
    }
}

/// Depth-first walk that skips non-content subtrees entirely
fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                if !text.trim().is_empty() {
                    out.push(text);
                }
            }
            Node::Element(el) if NON_CONTENT_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace runs to single spaces and trim the ends
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
