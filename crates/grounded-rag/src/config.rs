//! Configuration for the grounding pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::SourceKind;

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Which documents to consult
    pub sources: SourcesConfig,
    /// Network fetch settings
    pub fetch: FetchConfig,
    /// Text extraction limits
    pub extraction: ExtractionConfig,
    /// Source scheduling
    pub aggregation: AggregationConfig,
    /// Generation backend
    pub llm: LlmConfig,
    /// Prompt overrides
    pub prompt: PromptConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Load from `RAG_CONFIG` if set, otherwise defaults, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RAG_*` environment overrides on top of the loaded values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("RAG_PORT") {
            self.server.port = parse_override("RAG_PORT", &port)?;
        }
        if let Some(origin) = get("RAG_ALLOWED_ORIGIN") {
            self.server.allowed_origin = origin;
        }
        if let Some(path) = get("RAG_MANIFEST_PATH") {
            self.sources.mode = SourceMode::Manifest;
            self.sources.manifest_path = Some(PathBuf::from(path));
        }
        if let Some(max) = get("RAG_MAX_SOURCES") {
            self.sources.max_sources = parse_override("RAG_MAX_SOURCES", &max)?;
        }
        if let Some(pages) = get("RAG_MAX_PDF_PAGES") {
            self.extraction.max_pdf_pages = parse_override("RAG_MAX_PDF_PAGES", &pages)?;
        }
        if let Some(model) = get("RAG_GENERATION_MODEL") {
            self.llm.model = model;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.allowed_origin.trim().is_empty() {
            return Err(Error::Config("server.allowed_origin must be set".to_string()));
        }
        if self.sources.max_sources == 0 {
            return Err(Error::Config("sources.max_sources must be at least 1".to_string()));
        }
        if self.sources.mode == SourceMode::Manifest && self.sources.manifest_path.is_none() {
            return Err(Error::Config(
                "sources.manifest_path is required in manifest mode".to_string(),
            ));
        }
        if !self.sources.manifest_delimiter.is_ascii() {
            return Err(Error::Config("sources.manifest_delimiter must be ASCII".to_string()));
        }
        if self.fetch.page_timeout_secs == 0 || self.fetch.document_timeout_secs == 0 {
            return Err(Error::Config("fetch timeouts must be at least 1 second".to_string()));
        }
        if self.extraction.max_pdf_pages == 0 {
            return Err(Error::Config("extraction.max_pdf_pages must be at least 1".to_string()));
        }
        if self.extraction.max_chars_per_source == Some(0) {
            return Err(Error::Config(
                "extraction.max_chars_per_source must be at least 1 when set".to_string(),
            ));
        }
        if self.aggregation.workers == 0 {
            return Err(Error::Config("aggregation.workers must be at least 1".to_string()));
        }
        if self.aggregation.workers > 1 && self.aggregation.request_timeout_secs.is_none() {
            return Err(Error::Config(
                "aggregation.request_timeout_secs is required when workers > 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_override<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, value, e)))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// The single origin allowed by CORS
    pub allowed_origin: String,
    /// Preflight cache lifetime in seconds
    pub cors_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origin: "https://aneoapple.github.io".to_string(),
            cors_max_age_secs: 3600,
        }
    }
}

/// How the source list is resolved
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Fixed list from `sources.urls`
    #[default]
    Static,
    /// Rows of a tabular manifest file
    Manifest,
}

/// One statically configured source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticSource {
    /// Identifier used in provenance banners (defaults to the URL)
    #[serde(default)]
    pub id: Option<String>,
    /// Absolute URL
    pub url: String,
    /// Document kind (inferred from the URL when absent)
    #[serde(default)]
    pub kind: Option<SourceKind>,
}

impl StaticSource {
    /// Page source with an inferred id
    pub fn page(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            kind: Some(SourceKind::Html),
        }
    }
}

/// Source registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Resolution strategy
    pub mode: SourceMode,
    /// Static source list (static mode)
    pub urls: Vec<StaticSource>,
    /// Manifest file path (manifest mode)
    pub manifest_path: Option<PathBuf>,
    /// Manifest field delimiter
    pub manifest_delimiter: char,
    /// Keep only manifest rows whose URL contains this substring
    pub manifest_url_filter: Option<String>,
    /// Kind assumed for manifest rows without a `kind` column
    pub manifest_default_kind: SourceKind,
    /// Maximum number of sources consulted per request
    pub max_sources: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Static,
            urls: vec![
                StaticSource::page("https://www.affix.com.br/"),
                StaticSource::page("https://www.alter.com.br/"),
            ],
            manifest_path: None,
            manifest_delimiter: ',',
            manifest_url_filter: None,
            manifest_default_kind: SourceKind::Pdf,
            max_sources: 5,
        }
    }
}

/// Network fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for web pages in seconds
    pub page_timeout_secs: u64,
    /// Timeout for documents (PDF) in seconds
    pub document_timeout_secs: u64,
    /// Client identity sent with every request
    pub user_agent: String,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Timeout for a given source kind
    pub fn timeout_for(&self, kind: SourceKind) -> Duration {
        let secs = match kind {
            SourceKind::Html => self.page_timeout_secs,
            SourceKind::Pdf => self.document_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 15,
            document_timeout_secs: 45,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            max_redirects: 5,
        }
    }
}

/// Text extraction limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Pages read per PDF, in document order
    pub max_pdf_pages: usize,
    /// Truncate each source's text to this many characters
    pub max_chars_per_source: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pdf_pages: 10,
            max_chars_per_source: None,
        }
    }
}

/// Source scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Concurrent source workers (1 = sequential)
    pub workers: usize,
    /// Ceiling for the whole aggregation step in seconds
    pub request_timeout_secs: Option<u64>,
}

impl AggregationConfig {
    /// Request-level ceiling, if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            request_timeout_secs: None,
        }
    }
}

/// Generation backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini API (requires an API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// Generation model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Override for the backend base URL
    pub base_url: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Base URL for the configured backend
    pub fn base_url(&self) -> String {
        match (&self.base_url, self.backend) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmBackend::Gemini) => "https://generativelanguage.googleapis.com".to_string(),
            (None, LlmBackend::Ollama) => "http://localhost:11434".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            temperature: 0.2,
            max_output_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

/// Prompt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Replaces the built-in grounding instruction
    pub instruction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sources.urls.len(), 2);
        assert_eq!(config.server.cors_max_age_secs, 3600);
    }

    #[test]
    fn test_timeout_per_kind() {
        let fetch = FetchConfig::default();
        assert!(fetch.timeout_for(SourceKind::Html) < fetch.timeout_for(SourceKind::Pdf));
    }

    #[test]
    fn test_parse_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [sources]
            mode = "manifest"
            manifest_path = "docs.csv"
            max_sources = 5

            [extraction]
            max_pdf_pages = 3

            [llm]
            backend = "ollama"
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.mode, SourceMode::Manifest);
        assert_eq!(config.sources.max_sources, 5);
        assert_eq!(config.extraction.max_pdf_pages, 3);
        assert_eq!(config.llm.backend, LlmBackend::Ollama);
        assert_eq!(config.llm.base_url(), "http://localhost:11434");
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_static_source_kind_in_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [[sources.urls]]
            url = "https://example.com/report.pdf"
            kind = "pdf"

            [[sources.urls]]
            id = "home"
            url = "https://example.com/"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.urls[0].kind, Some(SourceKind::Pdf));
        assert_eq!(config.sources.urls[1].id.as_deref(), Some("home"));
        assert_eq!(config.sources.urls[1].kind, None);
    }

    #[test]
    fn test_validate_rejects_missing_bounds() {
        let mut config = RagConfig::default();
        config.sources.max_sources = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RagConfig::default();
        config.sources.mode = SourceMode::Manifest;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RagConfig::default();
        config.aggregation.workers = 4;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.aggregation.request_timeout_secs = Some(30);
        assert!(config.validate().is_ok());

        let mut config = RagConfig::default();
        config.extraction.max_chars_per_source = Some(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.extraction.max_chars_per_source = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RAG_PORT", "9090"),
            ("RAG_MANIFEST_PATH", "/data/pdfs.csv"),
            ("RAG_MAX_SOURCES", "7"),
            ("RAG_GENERATION_MODEL", " "),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.sources.mode, SourceMode::Manifest);
        assert_eq!(config.sources.manifest_path, Some(PathBuf::from("/data/pdfs.csv")));
        assert_eq!(config.sources.max_sources, 7);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_unparseable_override_is_rejected() {
        for (key, value) in [("RAG_PORT", "80a"), ("RAG_MAX_SOURCES", "-1"), ("RAG_MAX_PDF_PAGES", "ten")] {
            let mut config = RagConfig::default();
            let err = config
                .apply_overrides(|k| (k == key).then(|| value.to_string()))
                .unwrap_err();
            assert!(
                matches!(err, Error::Config(ref msg) if msg.contains(key)),
                "{key}={value}"
            );
        }
    }
}
