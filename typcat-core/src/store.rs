//! Manifest assembly across sources with per-source fallback (made by FontLab https://www.fontlab.com/)
//!
//! A store is built once from configuration and handed by reference to the
//! search engine and the installed-font matcher. Every `get` builds a fresh
//! [`Manifest`]; nothing is memoized between calls.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::cache::ManifestCache;
use crate::catalog::{Manifest, SourceCatalog};
use crate::config::{
    CatalogConfig, DEFAULT_CACHE_TTL, DEFAULT_MAX_SOURCE_SIZE, DEFAULT_REQUEST_TIMEOUT,
};
use crate::error::{CacheError, CatalogError, FetchError, SourceError, SourceFailure};
use crate::fetch::{CancelToken, HttpFetcher, SourceFetcher};
use crate::sources::{SourceConfig, SourceProvider};

/// Whether `get` may reuse cache files that are still within the TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    #[default]
    UseCacheIfFresh,
    ForceRefresh,
}

/// Where one source's catalog came from during a `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogOrigin {
    FreshCache,
    Fetched,
    StaleCache,
}

/// A manifest plus the non-fatal problems met while building it.
#[derive(Debug)]
pub struct ManifestReport {
    pub manifest: Manifest,
    /// Sources left out entirely.
    pub failures: Vec<SourceFailure>,
    /// Source ids whose fetch failed and that were served from the cache instead.
    pub stale: Vec<String>,
    /// Origin of every catalog in the manifest, in priority order.
    pub origins: Vec<(String, CatalogOrigin)>,
}

impl ManifestReport {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty() || !self.stale.is_empty()
    }
}

pub struct ManifestStore {
    cache: ManifestCache,
    fetcher: Box<dyn SourceFetcher + Send + Sync>,
    sources: Box<dyn SourceProvider + Send + Sync>,
    ttl: Duration,
    request_timeout: Duration,
    max_source_size: u64,
}

impl ManifestStore {
    pub fn new(
        cache: ManifestCache,
        fetcher: impl SourceFetcher + Send + Sync + 'static,
        sources: impl SourceProvider + Send + Sync + 'static,
    ) -> Self {
        Self {
            cache,
            fetcher: Box::new(fetcher),
            sources: Box::new(sources),
            ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
        }
    }

    /// Store over HTTP with every setting taken from `config`.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            ManifestCache::new(&config.cache_dir),
            HttpFetcher::new(),
            config.clone(),
        )
        .with_ttl(config.cache_ttl)
        .with_request_timeout(config.request_timeout)
        .with_max_source_size(config.max_source_size)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_source_size(mut self, bytes: u64) -> Self {
        self.max_source_size = bytes;
        self
    }

    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Enabled sources in priority order, as the store would process them.
    pub fn enabled_sources(&self) -> Result<Vec<SourceConfig>, CatalogError> {
        self.sources
            .enabled_sources()
            .map_err(CatalogError::Sources)
    }

    pub fn get(&self, policy: RefreshPolicy) -> Result<ManifestReport, CatalogError> {
        self.get_with_cancel(policy, &CancelToken::new())
    }

    /// Build a manifest, visiting sources one at a time in priority order.
    ///
    /// Per-source failures end up in the report. The call fails only when no
    /// source produced a catalog, fresh or stale.
    pub fn get_with_cancel(
        &self,
        policy: RefreshPolicy,
        cancel: &CancelToken,
    ) -> Result<ManifestReport, CatalogError> {
        let sources = self.enabled_sources()?;

        let mut catalogs = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();
        let mut stale = Vec::new();
        let mut origins = Vec::with_capacity(sources.len());

        for (priority, source) in sources.iter().enumerate() {
            match self.load_source(source, priority, policy, cancel) {
                Ok((catalog, origin)) => {
                    if origin == CatalogOrigin::StaleCache {
                        stale.push(source.id.clone());
                    }
                    origins.push((source.id.clone(), origin));
                    catalogs.push(catalog);
                }
                Err(error) => {
                    log::warn!("source {} left out of manifest: {error}", source.id);
                    failures.push(SourceFailure {
                        source_id: source.id.clone(),
                        source_name: source.name.clone(),
                        error,
                    });
                }
            }
        }

        if catalogs.is_empty() {
            return Err(CatalogError::NoSourcesAvailable(failures));
        }

        let manifest = Manifest::new(catalogs);
        log::info!(
            "manifest ready: {} sources, {} fonts, {} failed, {} stale",
            manifest.len(),
            manifest.font_count(),
            failures.len(),
            stale.len()
        );
        Ok(ManifestReport {
            manifest,
            failures,
            stale,
            origins,
        })
    }

    fn load_source(
        &self,
        source: &SourceConfig,
        priority: usize,
        policy: RefreshPolicy,
        cancel: &CancelToken,
    ) -> Result<(SourceCatalog, CatalogOrigin), SourceError> {
        if policy == RefreshPolicy::UseCacheIfFresh && self.cache.is_fresh(&source.id, self.ttl) {
            match self.cache.load(source, priority) {
                Ok(catalog) => {
                    log::debug!("using fresh cache for {}", source.id);
                    return Ok((catalog, CatalogOrigin::FreshCache));
                }
                Err(err) => log::warn!("fresh cache for {} unusable, refetching: {err}", source.id),
            }
        }

        let fetch_err = match self.fetch_catalog(source, priority, cancel) {
            Ok(catalog) => {
                if let Err(err) = self.cache.store(&source.id, &catalog) {
                    log::warn!("could not cache {}: {err}", source.id);
                }
                return Ok((catalog, CatalogOrigin::Fetched));
            }
            Err(err) => err,
        };

        match self.cache.load(source, priority) {
            Ok(catalog) => {
                log::warn!(
                    "{} fetch failed ({fetch_err}); using cache from {}",
                    source.id,
                    catalog.updated_at.to_rfc3339()
                );
                Ok((catalog, CatalogOrigin::StaleCache))
            }
            Err(CacheError::Miss { .. }) => Err(fetch_err.into()),
            Err(cache_err) => {
                log::debug!("no usable cache for {}: {cache_err}", source.id);
                Err(fetch_err.into())
            }
        }
    }

    fn fetch_catalog(
        &self,
        source: &SourceConfig,
        priority: usize,
        cancel: &CancelToken,
    ) -> Result<SourceCatalog, FetchError> {
        let raw = self.fetcher.fetch(
            &source.url,
            self.request_timeout,
            self.max_source_size,
            cancel,
        )?;
        SourceCatalog::from_document(source, priority, raw, Utc::now()).map_err(|err| {
            FetchError::InvalidContent {
                url: source.url.clone(),
                reason: err.to_string(),
            }
        })
    }
}

impl std::fmt::Debug for ManifestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestStore")
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .field("request_timeout", &self.request_timeout)
            .field("max_source_size", &self.max_source_size)
            .finish_non_exhaustive()
    }
}
