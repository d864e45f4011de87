/// typcat-core: the font catalog's memory and its matchmaker
///
/// Somewhere out there, Google Fonts, Nerd Fonts, and Font Squirrel each keep
/// a long ledger of families. This library fetches those ledgers, tucks them
/// away on disk, and answers two questions about them: "what looks like the
/// font I typed?" and "where did the fonts on this machine come from?"
///
/// ## How a Question Gets Answered
///
/// **Gathering**: [`store::ManifestStore`] visits every enabled source in
/// priority order. A fresh cache file is reused; otherwise the source is
/// fetched, and if the fetch fails the last cached copy steps in. One
/// unreachable source never takes the others down with it.
///
/// **Searching**: [`search::SearchEngine`] scores each entry by how strongly
/// the query matches (exact, prefix, substring, word), adds a capped
/// popularity bonus, and dampens short queries that land on long names.
///
/// **Matching**: [`installed::InstalledFontMatcher`] looks installed family
/// names up in a normalized index and reports the catalog entry, license,
/// and source behind each one, leaving system fonts alone.
///
/// ## A Sample Conversation
///
/// ```rust,no_run
/// use typcat_core::config::CatalogConfig;
/// use typcat_core::search::{SearchEngine, SearchOptions, SearchQuery};
/// use typcat_core::store::{ManifestStore, RefreshPolicy};
///
/// let config = CatalogConfig::load_default()?;
/// let store = ManifestStore::from_config(&config);
/// let engine = SearchEngine::new(SearchOptions::from(&config));
///
/// let outcome = engine.search_store(
///     &store,
///     RefreshPolicy::UseCacheIfFresh,
///     &SearchQuery::new("open sans").with_category("sans"),
/// )?;
/// for failure in &outcome.report.failures {
///     eprintln!("warning: {failure}");
/// }
/// for hit in outcome.results.iter().take(5) {
///     println!("{:>4}  {}  ({})", hit.score, hit.id, hit.source_name);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ## House Rules
///
/// - Cache files hold the exact bytes a source sent, written via temp file
///   and rename so nobody ever reads half a catalog.
/// - Every `get` builds a brand-new [`catalog::Manifest`]; nothing global
///   lingers between calls.
/// - Network work happens one source at a time, on the caller's thread.
///
/// ---
///
/// Crafted with care at FontLab https://www.fontlab.com/

pub mod cache;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod installed;
pub mod matching;
pub mod names;
pub mod output;
pub mod search;
pub mod sources;
pub mod store;
pub mod system_fonts;

pub use catalog::{FontEntry, Manifest, SourceCatalog};
pub use error::{CacheError, CatalogError, FetchError, SourceError, SourceFailure};
pub use installed::{InstalledFontMatch, InstalledFontMatcher};
pub use search::{MatchType, SearchEngine, SearchResult};
pub use store::{ManifestStore, RefreshPolicy};
