//! Source ingestion: registry, fetching, format-specific extraction and aggregation

mod aggregator;
mod fetcher;
mod html;
pub(crate) mod pdf;
mod registry;

pub use aggregator::{Aggregator, AggregatorConfig, Scheduler};
pub use fetcher::{Fetcher, HttpFetcher};
pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;
pub use registry::{SourceRegistry, SourceStrategy};
