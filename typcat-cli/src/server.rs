//! HTTP server for typcat, the catalog's front desk (made by FontLab https://www.fontlab.com/)
//!
//! The same store and search engine the CLI uses, served over a small JSON
//! API. Every request builds its manifest on a blocking worker, so a slow
//! source never stalls the async runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;

use typcat_core::config::CatalogConfig;
use typcat_core::error::CatalogError;
use typcat_core::installed::{InstalledFontMatch, InstalledFontMatcher};
use typcat_core::search::{SearchEngine, SearchOptions, SearchQuery, SearchResult};
use typcat_core::store::{ManifestReport, ManifestStore};
use typcat_core::system_fonts::is_critical_system_font;

use crate::refresh_policy;

/// Shared by every handler: one store, one engine.
#[derive(Clone, Debug)]
pub struct AppState {
    store: Arc<ManifestStore>,
    engine: SearchEngine,
}

impl AppState {
    pub fn new(store: ManifestStore, engine: SearchEngine) -> Self {
        Self {
            store: Arc::new(store),
            engine,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            ManifestStore::from_config(config),
            SearchEngine::new(SearchOptions::from(config)),
        )
    }
}

/// A catalog search, as posted to `/search`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    /// Free text matched against names and IDs; empty lists everything
    pub query: String,
    /// Category filter ("Sans Serif", "Monospace", ...)
    pub category: Option<String>,
    /// Source id, display name, or prefix
    pub source: Option<String>,
    pub limit: Option<usize>,
    /// Skip fresh caches and fetch every source
    pub refresh: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Sources left out of the manifest, with the reason
    pub warnings: Vec<String>,
    /// Sources answered from an outdated cache
    pub stale: Vec<String>,
}

/// Installed family names to trace back to the catalog, as posted to `/match`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MatchRequest {
    pub families: Vec<String>,
    pub refresh: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    /// Family name to catalog entry; unmatched families are absent
    pub matches: BTreeMap<String, InstalledFontMatch>,
    pub warnings: Vec<String>,
    pub stale: Vec<String>,
}

/// Bind to `bind` and serve until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;

    axum::serve(listener, router(state))
        .await
        .context("serving HTTP")?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .route("/match", post(match_handler))
        .with_state(state)
}

async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    if matches!(req.limit, Some(0)) {
        return Err(to_bad_request("limit must be at least 1 when provided"));
    }

    let mut query = SearchQuery::new(req.query.trim());
    if let Some(category) = req.category {
        query = query.with_category(category);
    }
    if let Some(source) = req.source {
        query = query.with_source(source);
    }
    if let Some(limit) = req.limit {
        query = query.with_limit(limit);
    }
    let policy = refresh_policy(req.refresh);

    let outcome =
        task::spawn_blocking(move || state.engine.search_store(&state.store, policy, &query))
            .await
            .map_err(join_error)?
            .map_err(to_unavailable)?;

    Ok(Json(SearchResponse {
        results: outcome.results,
        warnings: warnings(&outcome.report),
        stale: outcome.report.stale,
    }))
}

async fn match_handler(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    if req.families.iter().all(|family| family.trim().is_empty()) {
        return Err(to_bad_request("at least one family name is required"));
    }
    let policy = refresh_policy(req.refresh);

    let outcome = task::spawn_blocking(move || {
        InstalledFontMatcher::new().match_store(
            &state.store,
            policy,
            &req.families,
            is_critical_system_font,
        )
    })
    .await
    .map_err(join_error)?
    .map_err(to_unavailable)?;

    Ok(Json(MatchResponse {
        matches: outcome.matches,
        warnings: warnings(&outcome.report),
        stale: outcome.report.stale,
    }))
}

fn warnings(report: &ManifestReport) -> Vec<String> {
    report.failures.iter().map(ToString::to_string).collect()
}

fn to_bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn to_unavailable(err: CatalogError) -> (StatusCode, String) {
    (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
}

fn join_error(err: task::JoinError) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("task join error: {err}"),
    )
}
