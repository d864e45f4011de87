//! Typed failures for fetching, caching, and assembling catalogs (made by FontLab https://www.fontlab.com/)
//!
//! Per-source problems (`FetchError`, `CacheError`) are recovered inside
//! [`crate::store::ManifestStore::get`]; only [`CatalogError`] ever reaches
//! search or matching callers.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while retrieving one source document over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS, or transport failure before a status was received.
    #[error("source {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("source {url} answered HTTP {status}")]
    BadStatus { url: String, status: u16 },

    /// Body arrived but is not a JSON object.
    #[error("source {url} returned invalid content: {reason}")]
    InvalidContent { url: String, reason: String },

    #[error("source {url} exceeded the {limit} byte response limit")]
    TooLarge { url: String, limit: u64 },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

/// Failure while reading or writing the on-disk cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cached catalog for source {source_id}")]
    Miss { source_id: String },

    /// The file exists but is structurally broken or does not match the catalog schema.
    #[error("cached catalog for source {source_id} is corrupt: {reason}")]
    Corrupt { source_id: String, reason: String },

    #[error("cache I/O failed for {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why one source could not contribute to a manifest.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A source that was left out of a manifest, and the reason.
#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: String,
    pub source_name: String,
    pub error: SourceError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.source_name, self.source_id, self.error)
    }
}

/// Store-level failures surfaced to callers.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Every enabled source failed and none had a cached copy to fall back on.
    #[error("no font sources available{}", render_failures(.0))]
    NoSourcesAvailable(Vec<SourceFailure>),

    /// The enabled-source list itself could not be produced.
    #[error("font sources could not be configured: {0:#}")]
    Sources(anyhow::Error),

    /// Search or matching could not obtain a manifest to work on.
    #[error("font manifest unavailable: {0}")]
    ManifestUnavailable(#[source] Box<CatalogError>),
}

impl CatalogError {
    pub(crate) fn unavailable(self) -> Self {
        match self {
            already @ CatalogError::ManifestUnavailable(_) => already,
            other => CatalogError::ManifestUnavailable(Box::new(other)),
        }
    }

    /// Per-source causes, when the error carries them.
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            CatalogError::NoSourcesAvailable(failures) => failures,
            CatalogError::ManifestUnavailable(inner) => inner.failures(),
            CatalogError::Sources(_) => &[],
        }
    }
}

fn render_failures(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return " (no enabled sources)".to_string();
    }
    let parts: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!(": {}", parts.join("; "))
}
