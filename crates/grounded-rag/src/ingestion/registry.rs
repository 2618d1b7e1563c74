//! Source registry: resolves the ordered, bounded list of documents to consult

use std::path::{Path, PathBuf};
use url::Url;

use crate::config::{SourceMode, SourcesConfig, StaticSource};
use crate::error::{Error, Result};
use crate::types::{SourceDescriptor, SourceKind};

/// Where the source list comes from
#[derive(Debug, Clone)]
pub enum SourceStrategy {
    /// Fixed list from configuration
    Static(Vec<StaticSource>),
    /// Tabular manifest file with a required `url` column
    Manifest {
        /// Manifest location
        path: PathBuf,
        /// Field delimiter
        delimiter: u8,
        /// Keep only rows whose URL contains this substring
        url_filter: Option<String>,
        /// Kind for rows without a `kind` column
        default_kind: SourceKind,
    },
}

/// Resolves which documents to consult, truncated to `max_sources`
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    strategy: SourceStrategy,
    max_sources: usize,
}

impl SourceRegistry {
    /// Create a registry with an explicit source bound
    pub fn new(strategy: SourceStrategy, max_sources: usize) -> Self {
        Self {
            strategy,
            max_sources,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let strategy = match config.mode {
            SourceMode::Static => SourceStrategy::Static(config.urls.clone()),
            SourceMode::Manifest => {
                let path = config.manifest_path.clone().ok_or_else(|| {
                    Error::Config("sources.manifest_path is required in manifest mode".to_string())
                })?;
                let delimiter = u8::try_from(config.manifest_delimiter).map_err(|_| {
                    Error::Config("sources.manifest_delimiter must be ASCII".to_string())
                })?;
                SourceStrategy::Manifest {
                    path,
                    delimiter,
                    url_filter: config.manifest_url_filter.clone(),
                    default_kind: config.manifest_default_kind,
                }
            }
        };

        Ok(Self::new(strategy, config.max_sources))
    }

    /// Maximum sources returned by `resolve`
    pub fn max_sources(&self) -> usize {
        self.max_sources
    }

    /// Resolve the ordered source list
    pub fn resolve(&self) -> Result<Vec<SourceDescriptor>> {
        let sources = match &self.strategy {
            SourceStrategy::Static(entries) => self.resolve_static(entries),
            SourceStrategy::Manifest {
                path,
                delimiter,
                url_filter,
                default_kind,
            } => self.resolve_manifest(path, *delimiter, url_filter.as_deref(), *default_kind)?,
        };

        tracing::debug!("Resolved {} sources (max {})", sources.len(), self.max_sources);
        Ok(sources)
    }

    fn resolve_static(&self, entries: &[StaticSource]) -> Vec<SourceDescriptor> {
        entries
            .iter()
            .filter_map(|entry| match Url::parse(entry.url.trim()) {
                Ok(locator) => {
                    let kind = entry.kind.unwrap_or_else(|| SourceKind::infer(&locator));
                    let id = entry.id.clone().unwrap_or_else(|| locator.to_string());
                    Some(SourceDescriptor::new(id, locator, kind))
                }
                Err(e) => {
                    tracing::warn!("Skipping configured source '{}': {}", entry.url, e);
                    None
                }
            })
            .take(self.max_sources)
            .collect()
    }

    fn resolve_manifest(
        &self,
        path: &Path,
        delimiter: u8,
        url_filter: Option<&str>,
        default_kind: SourceKind,
    ) -> Result<Vec<SourceDescriptor>> {
        if !path.exists() {
            return Err(Error::ManifestMissing(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Error::Manifest(format!("{}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| Error::Manifest(format!("{}: {}", path.display(), e)))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let url_col = column("url").ok_or_else(|| {
            Error::Manifest(format!("{}: missing required 'url' column", path.display()))
        })?;
        let id_col = column("id");
        let kind_col = column("kind");

        let mut sources = Vec::new();
        for (row, record) in reader.records().enumerate() {
            if sources.len() >= self.max_sources {
                break;
            }

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping unreadable manifest row {}: {}", row + 2, e);
                    continue;
                }
            };

            let raw_url = record.get(url_col).unwrap_or_default();
            if raw_url.is_empty() {
                continue;
            }
            if let Some(filter) = url_filter {
                if !raw_url.contains(filter) {
                    continue;
                }
            }

            let locator = match Url::parse(raw_url) {
                Ok(locator) => locator,
                Err(e) => {
                    tracing::warn!("Skipping manifest row {} ('{}'): {}", row + 2, raw_url, e);
                    continue;
                }
            };

            let kind = kind_col
                .and_then(|col| record.get(col))
                .and_then(SourceKind::from_label)
                .unwrap_or(default_kind);
            let id = id_col
                .and_then(|col| record.get(col))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| locator.to_string());

            sources.push(SourceDescriptor::new(id, locator, kind));
        }

        Ok(sources)
    }
}
