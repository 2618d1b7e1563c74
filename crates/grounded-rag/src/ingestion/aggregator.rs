//! Aggregator: drives fetch + extraction over every source with per-source
//! failure isolation and index-ordered output

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RagConfig;
use crate::error::{FetchError, ParseError};
use crate::ingestion::{Fetcher, HtmlExtractor, PdfExtractor};
use crate::types::{AggregatedContext, ExtractionResult, SourceDescriptor, SourceKind};

/// How sources are scheduled.
///
/// One worker reproduces the sequential baseline. More workers fetch
/// concurrently; output order is always registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    workers: usize,
    request_timeout: Option<Duration>,
}

impl Scheduler {
    /// One source at a time, no request-level ceiling
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            request_timeout: None,
        }
    }

    /// Bounded worker pool with a ceiling on the whole aggregation
    pub fn pooled(workers: usize, request_timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            request_timeout: Some(request_timeout),
        }
    }

    /// Number of concurrent workers
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Aggregation settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Fetch timeout for web pages
    pub page_timeout: Duration,
    /// Fetch timeout for PDF documents
    pub document_timeout: Duration,
    /// Pages read per PDF
    pub max_pdf_pages: usize,
    /// Per-source text truncation
    pub max_chars_per_source: Option<usize>,
    /// Scheduling strategy
    pub scheduler: Scheduler,
}

impl AggregatorConfig {
    /// Derive settings from the application configuration
    pub fn from_config(config: &RagConfig) -> Self {
        let scheduler = match config.aggregation.request_timeout() {
            Some(ceiling) if config.aggregation.workers > 1 => {
                Scheduler::pooled(config.aggregation.workers, ceiling)
            }
            _ => Scheduler::sequential(),
        };

        Self {
            page_timeout: config.fetch.timeout_for(SourceKind::Html),
            document_timeout: config.fetch.timeout_for(SourceKind::Pdf),
            max_pdf_pages: config.extraction.max_pdf_pages,
            max_chars_per_source: config.extraction.max_chars_per_source,
            scheduler,
        }
    }

    fn timeout_for(&self, kind: SourceKind) -> Duration {
        match kind {
            SourceKind::Html => self.page_timeout,
            SourceKind::Pdf => self.document_timeout,
        }
    }
}

/// Builds the provenance-tagged context for a list of sources
pub struct Aggregator {
    fetcher: Arc<dyn Fetcher>,
    html: HtmlExtractor,
    pdf: PdfExtractor,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create an aggregator around a fetcher
    pub fn new(fetcher: Arc<dyn Fetcher>, config: AggregatorConfig) -> Self {
        Self {
            fetcher,
            html: HtmlExtractor,
            pdf: PdfExtractor::new(config.max_pdf_pages),
            config,
        }
    }

    /// Fetch and extract every source.
    ///
    /// Always returns exactly one entry per source, in input order; failed
    /// sources contribute a marker instead of being dropped.
    pub async fn aggregate(&self, sources: &[SourceDescriptor]) -> AggregatedContext {
        let results = self.run_all(sources).await;
        let context =
            AggregatedContext::from_results(sources, &results, self.config.max_chars_per_source);

        tracing::debug!("Aggregated {} sources", context.len());
        context
    }

    async fn run_all(&self, sources: &[SourceDescriptor]) -> Vec<ExtractionResult> {
        let mut slots: Vec<Option<ExtractionResult>> = vec![None; sources.len()];

        let futs: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(index, source)| async move { (index, self.process(source).await) })
            .collect();
        let tasks = stream::iter(futs).buffer_unordered(self.config.scheduler.workers);
        tokio::pin!(tasks);

        let deadline = self
            .config
            .scheduler
            .request_timeout
            .map(|ceiling| Instant::now() + ceiling);

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!("Aggregation ceiling reached, abandoning unfinished sources");
                        break;
                    }
                },
                None => tasks.next().await,
            };

            match next {
                Some((index, result)) => slots[index] = Some(result),
                None => break,
            }
        }

        slots
            .into_iter()
            .zip(sources)
            .map(|(slot, source)| {
                slot.unwrap_or_else(|| ExtractionResult::fetch_failed(source, &FetchError::Timeout))
            })
            .collect()
    }

    /// Fetch then extract one source; never fails
    async fn process(&self, source: &SourceDescriptor) -> ExtractionResult {
        let timeout = self.config.timeout_for(source.kind);

        let fetched = tokio::time::timeout(timeout, self.fetcher.fetch(&source.locator, timeout))
            .await
            .unwrap_or(Err(FetchError::Timeout));

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(source = %source.id, kind = e.kind(), "Fetch failed: {}", e);
                return ExtractionResult::fetch_failed(source, &e);
            }
        };

        match self.extract(source.kind, bytes, timeout).await {
            Ok(text) => {
                tracing::debug!(source = %source.id, "Extracted {} chars", text.len());
                ExtractionResult::ok(source, text)
            }
            Err(e) => {
                tracing::warn!(source = %source.id, kind = e.kind(), "Extraction failed: {}", e);
                ExtractionResult::parse_failed(source, &e)
            }
        }
    }

    async fn extract(&self, kind: SourceKind, bytes: Bytes, timeout: Duration) -> Result<String, ParseError> {
        match kind {
            SourceKind::Html => {
                let html = self.html;
                extract_blocking(timeout, move || Ok(html.extract(&bytes))).await
            }
            SourceKind::Pdf => {
                let pdf = self.pdf;
                extract_blocking(timeout, move || pdf.extract(&bytes)).await
            }
        }
    }
}

/// Run an extractor on the blocking pool, bounded by `timeout`.
///
/// A panic or an overrun becomes a `Corrupt` error for that source only.
/// The blocking thread is not cancelled on timeout; its result is discarded.
async fn extract_blocking<F>(timeout: Duration, extract: F) -> Result<String, ParseError>
where
    F: FnOnce() -> Result<String, ParseError> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(extract)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ParseError::Corrupt(format!("extraction task failed: {}", e))),
        Err(_) => Err(ParseError::Corrupt(format!(
            "extraction timeout after {} ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::pdf::tests::build_pdf;
    use crate::ingestion::registry::{SourceRegistry, SourceStrategy};
    use crate::ingestion::HttpFetcher;
    use crate::types::ExtractionStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;
    use url::Url;

    enum Reply {
        Body(Vec<u8>),
        Delayed(Duration, Vec<u8>),
        Fail(FetchError),
        Hang,
    }

    #[derive(Default)]
    struct StubFetcher {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn reply(mut self, url: &str, reply: Reply) -> Self {
            self.replies.insert(url.to_string(), reply);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, locator: &Url, _timeout: Duration) -> Result<Bytes, FetchError> {
            self.calls.lock().unwrap().push(locator.to_string());
            match self.replies.get(locator.as_str()) {
                Some(Reply::Body(body)) => Ok(Bytes::from(body.clone())),
                Some(Reply::Delayed(delay, body)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Bytes::from(body.clone()))
                }
                Some(Reply::Fail(err)) => Err(err.clone()),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(FetchError::Network("unreachable".into()))
                }
                None => Err(FetchError::HttpStatus(404)),
            }
        }
    }

    fn config(scheduler: Scheduler) -> AggregatorConfig {
        AggregatorConfig {
            page_timeout: Duration::from_millis(300),
            document_timeout: Duration::from_millis(500),
            max_pdf_pages: 10,
            max_chars_per_source: None,
            scheduler,
        }
    }

    fn source(id: &str, url: &str, kind: SourceKind) -> SourceDescriptor {
        SourceDescriptor::new(id, Url::parse(url).unwrap(), kind)
    }

    #[tokio::test]
    async fn test_one_entry_per_source_despite_failures() {
        let fetcher = StubFetcher::default()
            .reply("https://a.example/", Reply::Body(b"<p>alpha text</p>".to_vec()))
            .reply("https://b.example/", Reply::Fail(FetchError::Network("dns".into())))
            .reply("https://c.example/doc.pdf", Reply::Body(b"garbage".to_vec()))
            .reply("https://d.example/doc.pdf", Reply::Body(build_pdf(&["delta page"])))
            .reply("https://e.example/", Reply::Body(b"<script>only()</script>".to_vec()));
        let aggregator = Aggregator::new(Arc::new(fetcher), config(Scheduler::sequential()));

        let sources = vec![
            source("a", "https://a.example/", SourceKind::Html),
            source("b", "https://b.example/", SourceKind::Html),
            source("c", "https://c.example/doc.pdf", SourceKind::Pdf),
            source("d", "https://d.example/doc.pdf", SourceKind::Pdf),
            source("e", "https://e.example/", SourceKind::Html),
        ];
        let context = aggregator.aggregate(&sources).await;
        let entries = context.entries();

        assert_eq!(entries.len(), 5);
        let ids: Vec<_> = entries.iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);

        assert_eq!(entries[0].text, "alpha text");
        assert_eq!(entries[1].status, ExtractionStatus::FetchError);
        assert!(entries[1].text.contains("FETCH_ERROR") && entries[1].text.contains("'b'"));
        assert_eq!(entries[2].status, ExtractionStatus::ParseError);
        assert!(entries[2].text.contains("PARSE_ERROR"));
        assert_eq!(entries[3].text, "delta page");
        assert_eq!(entries[4].status, ExtractionStatus::Empty);

        for entry in entries {
            assert!(entry.banner.contains(&entry.source_id));
        }
    }

    #[tokio::test]
    async fn test_unreachable_source_does_not_affect_others() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/ok");
                then.status(200).body("<main><p>still here</p></main>");
            })
            .await;

        let fetcher = HttpFetcher::new(&crate::config::FetchConfig::default()).unwrap();
        let aggregator = Aggregator::new(Arc::new(fetcher), config(Scheduler::sequential()));
        let sources = vec![
            source("down", "http://127.0.0.1:1/", SourceKind::Html),
            source("up", &server.url("/ok"), SourceKind::Html),
        ];

        let context = aggregator.aggregate(&sources).await;
        assert_eq!(context.len(), 2);
        assert_eq!(context.entries()[0].status, ExtractionStatus::FetchError);
        assert!(context.entries()[0].text.contains("FETCH_ERROR"));
        assert_eq!(context.entries()[1].text, "still here");
    }

    #[tokio::test]
    async fn test_manifest_bound_fetches_prefix_in_order() {
        let mut manifest = tempfile::NamedTempFile::new().unwrap();
        writeln!(manifest, "url").unwrap();
        let mut fetcher = StubFetcher::default();
        for i in 1..=20 {
            let url = format!("https://docs.example/{}.pdf", i);
            writeln!(manifest, "{}", url).unwrap();
            let page = format!("document {}", i);
            fetcher = fetcher.reply(&url, Reply::Body(build_pdf(&[page.as_str()])));
        }
        manifest.flush().unwrap();

        let registry = SourceRegistry::new(
            SourceStrategy::Manifest {
                path: manifest.path().to_path_buf(),
                delimiter: b',',
                url_filter: None,
                default_kind: SourceKind::Pdf,
            },
            5,
        );
        let fetcher = Arc::new(fetcher);
        let aggregator = Aggregator::new(fetcher.clone(), config(Scheduler::sequential()));

        let sources = registry.resolve().unwrap();
        let context = aggregator.aggregate(&sources).await;

        let expected: Vec<String> = (1..=5).map(|i| format!("https://docs.example/{}.pdf", i)).collect();
        assert_eq!(fetcher.calls(), expected);
        assert_eq!(context.len(), 5);
        for (i, entry) in context.entries().iter().enumerate() {
            assert_eq!(entry.text, format!("document {}", i + 1));
        }
    }

    #[tokio::test]
    async fn test_pooled_output_keeps_registry_order() {
        let fetcher = StubFetcher::default()
            .reply("https://slow.example/", Reply::Delayed(Duration::from_millis(150), b"<p>slow</p>".to_vec()))
            .reply("https://fast.example/", Reply::Body(b"<p>fast</p>".to_vec()));
        let aggregator = Aggregator::new(
            Arc::new(fetcher),
            config(Scheduler::pooled(4, Duration::from_secs(5))),
        );

        let sources = vec![
            source("slow", "https://slow.example/", SourceKind::Html),
            source("fast", "https://fast.example/", SourceKind::Html),
        ];
        let context = aggregator.aggregate(&sources).await;

        assert_eq!(context.entries()[0].text, "slow");
        assert_eq!(context.entries()[1].text, "fast");
    }

    #[tokio::test]
    async fn test_hung_source_times_out_alone() {
        let fetcher = StubFetcher::default()
            .reply("https://hang.example/", Reply::Hang)
            .reply("https://ok.example/", Reply::Body(b"<p>ok</p>".to_vec()));
        let aggregator = Aggregator::new(
            Arc::new(fetcher),
            config(Scheduler::pooled(2, Duration::from_secs(5))),
        );

        let sources = vec![
            source("hang", "https://hang.example/", SourceKind::Html),
            source("ok", "https://ok.example/", SourceKind::Html),
        ];
        let started = std::time::Instant::now();
        let context = aggregator.aggregate(&sources).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(context.entries()[0].status, ExtractionStatus::FetchError);
        assert!(context.entries()[0].text.contains("timeout"));
        assert_eq!(context.entries()[1].text, "ok");
    }

    #[tokio::test]
    async fn test_request_ceiling_marks_unfinished_sources() {
        let fetcher = StubFetcher::default()
            .reply("https://ok.example/", Reply::Body(b"<p>ok</p>".to_vec()))
            .reply("https://slow.example/doc.pdf", Reply::Delayed(Duration::from_secs(3), Vec::new()));
        let mut config = config(Scheduler::pooled(2, Duration::from_millis(200)));
        config.document_timeout = Duration::from_secs(10);
        let aggregator = Aggregator::new(Arc::new(fetcher), config);

        let sources = vec![
            source("ok", "https://ok.example/", SourceKind::Html),
            source("slow", "https://slow.example/doc.pdf", SourceKind::Pdf),
        ];
        let context = aggregator.aggregate(&sources).await;

        assert_eq!(context.len(), 2);
        assert_eq!(context.entries()[0].text, "ok");
        assert_eq!(context.entries()[1].status, ExtractionStatus::FetchError);
    }

    #[test]
    fn test_scheduler_from_config() {
        let mut rag = RagConfig::default();
        assert_eq!(AggregatorConfig::from_config(&rag).scheduler, Scheduler::sequential());

        rag.aggregation.workers = 3;
        rag.aggregation.request_timeout_secs = Some(20);
        let config = AggregatorConfig::from_config(&rag);
        assert_eq!(config.scheduler, Scheduler::pooled(3, Duration::from_secs(20)));
        assert!(config.page_timeout < config.document_timeout);
    }

    #[tokio::test]
    async fn test_slow_extraction_times_out() {
        let start = std::time::Instant::now();
        let err = extract_blocking(Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ParseError::Corrupt(ref msg) if msg.contains("extraction timeout")));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_extractor_panic_is_parse_error() {
        let err = extract_blocking(Duration::from_secs(5), || -> Result<String, ParseError> {
            panic!("malformed font table")
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ParseError::Corrupt(ref msg) if msg.contains("extraction task failed")));
    }

    #[tokio::test]
    async fn test_extraction_within_budget_succeeds() {
        let text = extract_blocking(Duration::from_secs(5), || Ok("Affix".to_string()))
            .await
            .unwrap();
        assert_eq!(text, "Affix");
    }
}
