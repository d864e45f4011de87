//! Ranked catalog search (made by FontLab https://www.fontlab.com/)
//!
//! Every entry gets a base score, a bonus for the strongest match tier
//! against its name or ID, an optional (capped) popularity bonus, and a
//! length dampener when a short query hits a much longer name.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::{FontEntry, Manifest, SourceCatalog};
use crate::config::{CatalogConfig, DEFAULT_POPULARITY_CAP};
use crate::error::CatalogError;
use crate::matching::{normalize_name, MatchTier, QueryText, TierBonuses};
use crate::store::{ManifestReport, ManifestStore, RefreshPolicy};

/// Score every matching entry starts from.
pub const BASE_SCORE: u32 = 50;
/// Below this query/name length ratio the score is dampened.
pub const LENGTH_PENALTY_THRESHOLD: f64 = 0.5;

/// How a result matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Exact,
    Prefix,
    Substring,
    Word,
    /// Empty query: selected by category or source alone.
    SourceOnly,
}

impl From<MatchTier> for MatchType {
    fn from(tier: MatchTier) -> Self {
        match tier {
            MatchTier::Exact => MatchType::Exact,
            MatchTier::Prefix => MatchType::Prefix,
            MatchTier::Substring => MatchType::Substring,
            MatchTier::Word => MatchType::Word,
        }
    }
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Prefix => "prefix",
            MatchType::Substring => "substring",
            MatchType::Word => "word",
            MatchType::SourceOnly => "source-only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    /// Source id.
    pub source: String,
    pub source_name: String,
    pub license: String,
    pub categories: Vec<String>,
    pub popularity: u32,
    pub score: u32,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub enable_popularity_sort: bool,
    /// Upper bound on the popularity bonus.
    pub popularity_cap: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            enable_popularity_sort: true,
            popularity_cap: DEFAULT_POPULARITY_CAP,
        }
    }
}

impl From<&CatalogConfig> for SearchOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            enable_popularity_sort: config.enable_popularity_sort,
            popularity_cap: config.popularity_cap,
        }
    }
}

/// Query text plus optional category and source filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub text: String,
    pub category: Option<String>,
    /// Source id, display name, or prefix.
    pub source: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into()).filter(|c: &String| !c.trim().is_empty());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Search results together with the manifest report they were computed from.
#[derive(Debug)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub report: ManifestReport,
}

#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    options: SearchOptions,
    bonuses: TierBonuses,
}

impl SearchEngine {
    pub fn new(options: SearchOptions) -> Self {
        let engine = Self {
            options,
            bonuses: TierBonuses::default(),
        };
        engine.warn_on_tier_overlap();
        engine
    }

    pub fn with_bonuses(mut self, bonuses: TierBonuses) -> Self {
        self.bonuses = bonuses;
        self.warn_on_tier_overlap();
        self
    }

    /// True when no popularity bonus can lift a match above a stronger tier.
    pub fn tiers_stay_ordered(&self) -> bool {
        match self.bonuses.min_gap() {
            None => false,
            Some(gap) => !self.options.enable_popularity_sort || self.options.popularity_cap < gap,
        }
    }

    fn warn_on_tier_overlap(&self) {
        if self.tiers_stay_ordered() {
            return;
        }
        match self.bonuses.min_gap() {
            None => log::warn!(
                "tier bonuses {:?} are not strictly decreasing; weaker tiers may outrank stronger ones",
                self.bonuses
            ),
            Some(gap) => log::warn!(
                "popularity cap {} reaches the tier gap {gap}; popular weak matches may outrank stronger tiers",
                self.options.popularity_cap
            ),
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Rank entries of `manifest` against `query`, keeping only `category` when non-empty.
    pub fn search(&self, manifest: &Manifest, query: &str, category: &str) -> Vec<SearchResult> {
        let mut request = SearchQuery::new(query);
        if !category.trim().is_empty() {
            request = request.with_category(category);
        }
        self.run(manifest, &request)
    }

    /// Full form of [`search`](Self::search) with source filter and limit.
    pub fn run(&self, manifest: &Manifest, request: &SearchQuery) -> Vec<SearchResult> {
        let query = QueryText::new(&request.text);
        let category = request
            .category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        let source = request
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut scored: Vec<(usize, SearchResult)> = Vec::new();
        for catalog in manifest.sources() {
            if source.is_some_and(|label| !catalog.answers_to(label)) {
                continue;
            }
            for font in catalog.fonts.values() {
                if let Some(wanted) = category.as_deref() {
                    if !in_category(font, wanted) {
                        continue;
                    }
                }
                if let Some((score, match_type)) = self.score(&query, font) {
                    scored.push((catalog.priority, to_result(catalog, font, score, match_type)));
                }
            }
        }

        scored.sort_by(|(pa, a), (pb, b)| compare_ranked(*pa, a, *pb, b));
        let mut results: Vec<SearchResult> = scored.into_iter().map(|(_, r)| r).collect();
        if let Some(limit) = request.limit {
            results.truncate(limit);
        }
        results
    }

    /// Obtain a manifest from `store` and search it.
    ///
    /// The only failure is not being able to build a manifest at all.
    pub fn search_store(
        &self,
        store: &ManifestStore,
        policy: RefreshPolicy,
        request: &SearchQuery,
    ) -> Result<SearchOutcome, CatalogError> {
        let report = store.get(policy).map_err(CatalogError::unavailable)?;
        let results = self.run(&report.manifest, request);
        log::debug!("query {:?} matched {} entries", request.text, results.len());
        Ok(SearchOutcome { results, report })
    }

    /// Score one entry, or `None` if it does not match a non-empty query.
    pub fn score(&self, query: &QueryText, font: &FontEntry) -> Option<(u32, MatchType)> {
        let popularity = self.popularity_bonus(font.popularity);

        if query.is_empty() {
            return Some((BASE_SCORE.saturating_add(popularity), MatchType::SourceOnly));
        }

        let name = normalize_name(&font.name);
        let id_name = normalize_name(font.id_name());
        let by_name = query.classify_normalized(&name).map(|tier| (tier, name.as_str()));
        let by_id = query
            .classify_normalized(&id_name)
            .map(|tier| (tier, id_name.as_str()));

        let (tier, matched) = match (by_name, by_id) {
            (Some(a), Some(b)) => {
                if b.0 > a.0 {
                    b
                } else {
                    a
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return None,
        };

        let raw = f64::from(
            BASE_SCORE
                .saturating_add(self.bonuses.bonus(tier))
                .saturating_add(popularity),
        );
        let score = (raw * length_penalty(query.len(), matched.chars().count())).round();
        Some((score as u32, tier.into()))
    }

    fn popularity_bonus(&self, popularity: u32) -> u32 {
        if self.options.enable_popularity_sort {
            (popularity / 2).min(self.options.popularity_cap)
        } else {
            0
        }
    }
}

/// `sqrt(query/name)` when the query is less than half the name, else 1.
pub fn length_penalty(query_len: usize, name_len: usize) -> f64 {
    if name_len == 0 {
        return 1.0;
    }
    let ratio = query_len as f64 / name_len as f64;
    if ratio < LENGTH_PENALTY_THRESHOLD {
        ratio.sqrt()
    } else {
        1.0
    }
}

fn in_category(font: &FontEntry, wanted_lower: &str) -> bool {
    font.categories
        .iter()
        .any(|c| c.to_lowercase().contains(wanted_lower))
}

fn to_result(catalog: &SourceCatalog, font: &FontEntry, score: u32, match_type: MatchType) -> SearchResult {
    SearchResult {
        id: font.id.clone(),
        name: font.name.clone(),
        source: catalog.id.clone(),
        source_name: catalog.name.clone(),
        license: font.license.clone(),
        categories: font.categories.clone(),
        popularity: font.popularity,
        score,
        match_type,
    }
}

/// Score descending, then source priority, then name, then id.
fn compare_ranked(pa: usize, a: &SearchResult, pb: usize, b: &SearchResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| pa.cmp(&pb))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}
