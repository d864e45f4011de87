//! typcat CLI (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeSet;
use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use serde::Serialize;

use typcat_core::cache::CacheEntryStatus;
use typcat_core::config::CatalogConfig;
use typcat_core::discovery::{FontDiscovery, PathDiscovery};
use typcat_core::installed::{InstalledFontMatch, InstalledFontMatcher};
use typcat_core::matching::similar_names;
use typcat_core::names::collect_families;
use typcat_core::output::{write_json_pretty, write_ndjson};
use typcat_core::search::{SearchEngine, SearchOptions, SearchQuery, SearchResult};
use typcat_core::sources::SourceConfig;
use typcat_core::store::{CatalogOrigin, ManifestReport, ManifestStore, RefreshPolicy};
use typcat_core::system_fonts::is_critical_system_font;

pub mod server;

/// Env var listing font roots to scan instead of the platform defaults.
const SYSTEM_FONT_DIRS_ENV: &str = "TYPCAT_SYSTEM_FONT_DIRS";
const SUGGESTION_LIMIT: usize = 5;

/// CLI entrypoint for typcat.
#[derive(Debug, Parser)]
#[command(
    name = "typcat",
    about = "Font catalog search and installed-font provenance (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    /// Config file (defaults to TYPCAT_CONFIG or the platform config dir)
    #[arg(long = "config", global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the merged font catalog
    Search(SearchArgs),
    /// Find the catalog entries behind installed fonts
    Match(MatchArgs),
    /// Refresh every source now and report where each catalog came from
    Update(UpdateArgs),
    /// Inspect or clear cached catalogs
    #[command(subcommand)]
    Cache(CacheCommand),
    /// List configured font sources
    Sources(SourcesArgs),
    /// Serve search and matching over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Words to look for in font names and IDs (omit to list everything)
    #[arg(value_name = "QUERY")]
    query: Vec<String>,

    /// Only fonts in this category (e.g. "Sans Serif", "Monospace")
    #[arg(short = 'c', long = "category", value_hint = ValueHint::Other)]
    category: Option<String>,

    /// Only fonts from this source (id, name, or prefix)
    #[arg(short = 's', long = "source", value_hint = ValueHint::Other)]
    source: Option<String>,

    /// Show at most this many results
    #[arg(short = 'l', long = "limit")]
    limit: Option<usize>,

    /// Ignore fresh caches and fetch every source
    #[arg(long = "refresh", action = ArgAction::SetTrue)]
    refresh: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Font files or directories to scan ("-" reads paths from STDIN)
    #[arg(value_hint = ValueHint::DirPath)]
    paths: Vec<PathBuf>,

    /// Read newline-delimited paths from STDIN
    #[arg(long = "stdin-paths", action = ArgAction::SetTrue)]
    stdin_paths: bool,

    /// Include common system font directories (the default when nothing else is given)
    #[arg(long = "system-fonts", action = ArgAction::SetTrue)]
    system_fonts: bool,

    /// Match this family name directly, without scanning files
    #[arg(short = 'F', long = "family", value_hint = ValueHint::Other)]
    families: Vec<String>,

    /// Follow symlinks while walking paths
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Also list families that have no catalog entry
    #[arg(long = "unmatched", action = ArgAction::SetTrue)]
    unmatched: bool,

    /// Ignore fresh caches and fetch every source
    #[arg(long = "refresh", action = ArgAction::SetTrue)]
    refresh: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    /// Show size, age, and freshness of each cached catalog
    Status(CacheStatusArgs),
    /// Check that every cached catalog would be trusted on load
    Validate,
    /// Delete one cached catalog, or all of them
    Clear(CacheClearArgs),
    /// Print the cache directory
    Path,
}

#[derive(Debug, Args)]
struct CacheStatusArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct CacheClearArgs {
    /// Source id, name, or prefix
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    source: Option<String>,

    /// Remove every cached catalog and leftover temp file
    #[arg(long = "all", action = ArgAction::SetTrue)]
    all: bool,
}

#[derive(Debug, Args)]
struct SourcesArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Format output as padded columns
    #[arg(long = "columns", action = ArgAction::SetTrue)]
    columns: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

impl OutputArgs {
    fn is_machine(&self) -> bool {
        self.json || self.ndjson
    }

    fn use_color(&self, stream: &impl IsTerminal) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => stream.is_terminal(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    log::debug!(
        "cache dir {}, ttl {:?}, {} sources configured",
        config.cache_dir.display(),
        config.cache_ttl,
        config.sources.len()
    );

    match cli.command {
        Command::Search(args) => run_search(&config, args),
        Command::Match(args) => run_match(&config, args),
        Command::Update(args) => run_update(&config, args),
        Command::Cache(cmd) => run_cache(&config, cmd),
        Command::Sources(args) => run_sources(&config, args),
        Command::Serve(args) => run_serve(&config, args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> Result<CatalogConfig> {
    let Some(path) = explicit else {
        return CatalogConfig::load_default();
    };
    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }
    let mut config = CatalogConfig::load(path)?;
    config.apply_overrides(|key| env::var(key).ok());
    Ok(config)
}

fn refresh_policy(refresh: bool) -> RefreshPolicy {
    if refresh {
        RefreshPolicy::ForceRefresh
    } else {
        RefreshPolicy::UseCacheIfFresh
    }
}

fn build_search_query(args: &SearchArgs) -> Result<SearchQuery> {
    if matches!(args.limit, Some(0)) {
        return Err(anyhow!("--limit must be at least 1"));
    }

    let mut query = SearchQuery::new(args.query.join(" ").trim());
    if let Some(category) = &args.category {
        query = query.with_category(category.as_str());
    }
    if let Some(source) = &args.source {
        query = query.with_source(source.as_str());
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    Ok(query)
}

fn run_search(config: &CatalogConfig, args: SearchArgs) -> Result<()> {
    let query = build_search_query(&args)?;
    let store = ManifestStore::from_config(config);
    let engine = SearchEngine::new(SearchOptions::from(config));

    let outcome = engine.search_store(&store, refresh_policy(args.refresh), &query)?;
    write_warnings(&outcome.report, io::stderr().lock())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = args.output.use_color(&handle);

    if outcome.results.is_empty() && !args.output.is_machine() {
        let names = outcome.report.manifest.entries().map(|(_, font)| font.name.as_str());
        let suggestions = similar_names(&query.text, names, SUGGESTION_LIMIT);
        write_no_results(&query, &suggestions, io::stderr().lock())?;
        return Ok(());
    }

    if args.output.ndjson {
        write_ndjson(&outcome.results, &mut handle)?;
    } else if args.output.json {
        write_json_pretty(&outcome.results, &mut handle)?;
    } else if args.output.columns {
        write_result_columns(&outcome.results, &mut handle, use_color)?;
    } else {
        write_result_plain(&outcome.results, &mut handle, use_color)?;
    }

    Ok(())
}

/// One line of `match` output.
#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    family: &'a str,
    #[serde(flatten)]
    found: Option<&'a InstalledFontMatch>,
}

fn run_match(config: &CatalogConfig, args: MatchArgs) -> Result<()> {
    let families = gather_families(&args, io::stdin().lock())?;
    if families.is_empty() {
        return Err(anyhow!("no installed font families found"));
    }
    log::info!("matching {} installed families", families.len());

    let store = ManifestStore::from_config(config);
    let outcome = InstalledFontMatcher::new().match_store(
        &store,
        refresh_policy(args.refresh),
        &families,
        is_critical_system_font,
    )?;
    write_warnings(&outcome.report, io::stderr().lock())?;

    let rows: Vec<MatchRow<'_>> = families
        .iter()
        .map(|family| MatchRow {
            family,
            found: outcome.matches.get(family),
        })
        .filter(|row| args.unmatched || row.found.is_some())
        .collect();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = args.output.use_color(&handle);

    if args.output.ndjson {
        write_ndjson(&rows, &mut handle)?;
    } else if args.output.json {
        write_json_pretty(&rows, &mut handle)?;
    } else if args.output.columns {
        write_match_columns(&rows, &mut handle, use_color)?;
    } else {
        write_match_plain(&rows, &mut handle, use_color)?;
    }

    Ok(())
}

fn gather_families(args: &MatchArgs, stdin: impl BufRead) -> Result<BTreeSet<String>> {
    let mut families: BTreeSet<String> = args
        .families
        .iter()
        .map(|family| family.trim())
        .filter(|family| !family.is_empty())
        .map(str::to_string)
        .collect();

    let scan_defaults = args.paths.is_empty() && !args.stdin_paths && families.is_empty();
    let include_system = args.system_fonts || scan_defaults;
    if !include_system && args.paths.is_empty() && !args.stdin_paths {
        return Ok(families);
    }

    let paths = gather_paths(&args.paths, args.stdin_paths, include_system, stdin)?;
    let files = PathDiscovery::new(paths)
        .follow_symlinks(args.follow_symlinks)
        .discover()?;
    log::info!("found {} font files", files.len());
    families.extend(collect_families(&files));
    Ok(families)
}

#[derive(Debug, Serialize)]
struct UpdateRow {
    source: String,
    origin: Option<CatalogOrigin>,
    fonts: usize,
    error: Option<String>,
}

fn run_update(config: &CatalogConfig, args: UpdateArgs) -> Result<()> {
    let store = ManifestStore::from_config(config);
    let report = store.get(RefreshPolicy::ForceRefresh)?;

    let mut rows: Vec<UpdateRow> = report
        .origins
        .iter()
        .map(|(id, origin)| UpdateRow {
            source: id.clone(),
            origin: Some(*origin),
            fonts: report.manifest.source(id).map_or(0, |catalog| catalog.len()),
            error: None,
        })
        .collect();
    rows.extend(report.failures.iter().map(|failure| UpdateRow {
        source: failure.source_id.clone(),
        origin: None,
        fonts: 0,
        error: Some(failure.error.to_string()),
    }));

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        return write_json_pretty(&rows, &mut handle);
    }

    for row in &rows {
        match (&row.origin, &row.error) {
            (Some(origin), _) => writeln!(
                handle,
                "{:<16} {:<12} {} fonts",
                row.source,
                origin_label(*origin),
                row.fonts
            )?,
            (None, Some(error)) => writeln!(handle, "{:<16} {:<12} {error}", row.source, "failed")?,
            (None, None) => {}
        }
    }
    Ok(())
}

fn origin_label(origin: CatalogOrigin) -> &'static str {
    match origin {
        CatalogOrigin::FreshCache => "cached",
        CatalogOrigin::Fetched => "fetched",
        CatalogOrigin::StaleCache => "stale",
    }
}

fn run_cache(config: &CatalogConfig, cmd: CacheCommand) -> Result<()> {
    let store = ManifestStore::from_config(config);
    let cache = store.cache();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cmd {
        CacheCommand::Status(args) => {
            let entries = cache.status(config.cache_ttl)?;
            if args.json {
                return write_json_pretty(&entries, &mut handle);
            }
            write_cache_status(&entries, &mut handle)?;
            writeln!(
                handle,
                "{} files, {} in {}",
                entries.len(),
                format_size(cache.total_size()?),
                cache.dir().display()
            )?;
        }
        CacheCommand::Validate => {
            let report = cache.validate()?;
            for id in &report.valid {
                writeln!(handle, "ok       {id}")?;
            }
            for id in &report.invalid {
                writeln!(handle, "invalid  {id}")?;
            }
            if !report.is_clean() {
                return Err(anyhow!(
                    "{} cached catalog(s) failed validation",
                    report.invalid.len()
                ));
            }
        }
        CacheCommand::Clear(args) => {
            if args.all {
                let removed = cache.clear_all()?;
                writeln!(handle, "removed {removed} cache file(s)")?;
            } else if let Some(label) = args.source.as_deref() {
                let id = resolve_source_id(&config.sources, label);
                if cache.clear(&id)? {
                    writeln!(handle, "removed cache for {id}")?;
                } else {
                    writeln!(handle, "no cache for {id}")?;
                }
            }
        }
        CacheCommand::Path => {
            writeln!(handle, "{}", cache.dir().display())?;
        }
    }
    Ok(())
}

/// Map a user-typed label to a configured source id; unknown labels pass through.
fn resolve_source_id(sources: &[SourceConfig], label: &str) -> String {
    sources
        .iter()
        .find(|source| source.answers_to(label))
        .map(|source| source.id.clone())
        .unwrap_or_else(|| label.trim().to_string())
}

fn run_sources(config: &CatalogConfig, args: SourcesArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        return write_json_pretty(&config.sources, &mut handle);
    }

    let enabled: Vec<String> = store_order(config)?;
    for source in &config.sources {
        let rank = enabled
            .iter()
            .position(|id| *id == source.id)
            .map(|pos| (pos + 1).to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            handle,
            "{rank:>2}  {:<16} {:<10} {:<16} {}",
            source.id,
            source.prefix,
            source.name,
            if source.enabled { source.url.as_str() } else { "(disabled)" }
        )?;
    }
    Ok(())
}

fn store_order(config: &CatalogConfig) -> Result<Vec<String>> {
    let sources = ManifestStore::from_config(config).enabled_sources()?;
    Ok(sources.into_iter().map(|source| source.id).collect())
}

fn run_serve(config: &CatalogConfig, args: ServeArgs) -> Result<()> {
    let state = server::AppState::from_config(config);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    log::info!("listening on {}", args.bind);
    runtime.block_on(server::serve(&args.bind, state))
}

fn gather_paths(
    raw_paths: &[PathBuf],
    read_stdin: bool,
    include_system: bool,
    mut stdin: impl BufRead,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    if read_stdin {
        paths.extend(read_paths_from(&mut stdin)?);
    }

    for path in raw_paths {
        if path == Path::new("-") {
            paths.extend(read_paths_from(&mut stdin)?);
        } else {
            paths.push(path.clone());
        }
    }

    if include_system {
        paths.extend(system_font_roots()?);
    }

    if paths.is_empty() {
        return Err(anyhow!("no font paths provided"));
    }

    Ok(paths)
}

fn read_paths_from(reader: &mut impl BufRead) -> Result<Vec<PathBuf>> {
    let mut buf = String::new();
    let mut paths = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }

        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            paths.push(PathBuf::from(trimmed));
        }
    }

    Ok(paths)
}

fn system_font_roots() -> Result<Vec<PathBuf>> {
    if let Ok(raw) = env::var(SYSTEM_FONT_DIRS_ENV) {
        let mut overrides: Vec<PathBuf> = raw
            .split([':', ';'])
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .collect();

        overrides.sort();
        overrides.dedup();

        return if overrides.is_empty() {
            Err(anyhow!("{SYSTEM_FONT_DIRS_ENV} is set but no paths exist"))
        } else {
            Ok(overrides)
        };
    }

    let mut candidates: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "macos")]
    {
        candidates.push(PathBuf::from("/System/Library/Fonts"));
        candidates.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        candidates.push(PathBuf::from("/usr/share/fonts"));
        candidates.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = env::var_os("HOME") {
            let home = PathBuf::from(home);
            candidates.push(home.join(".local/share/fonts"));
            candidates.push(home.join(".fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(system_root) = env::var_os("SYSTEMROOT") {
            candidates.push(PathBuf::from(system_root).join("Fonts"));
        }
        if let Some(local_appdata) = env::var_os("LOCALAPPDATA") {
            candidates.push(PathBuf::from(local_appdata).join("Microsoft/Windows/Fonts"));
        }
    }

    candidates.retain(|p| p.exists());
    candidates.sort();
    candidates.dedup();

    if candidates.is_empty() {
        return Err(anyhow!(
            "no system font directories found for this platform"
        ));
    }

    Ok(candidates)
}

fn write_warnings(report: &ManifestReport, mut w: impl Write) -> Result<()> {
    for failure in &report.failures {
        writeln!(w, "warning: source unavailable: {failure}")?;
    }
    for id in &report.stale {
        writeln!(w, "warning: {id} served from an outdated cache")?;
    }
    Ok(())
}

fn write_no_results(query: &SearchQuery, suggestions: &[String], mut w: impl Write) -> Result<()> {
    if query.text.is_empty() {
        writeln!(w, "no fonts found")?;
    } else {
        writeln!(w, "no fonts matched {:?}", query.text)?;
    }
    if !suggestions.is_empty() {
        writeln!(w, "did you mean: {}", suggestions.join(", "))?;
    }
    Ok(())
}

fn write_result_plain(results: &[SearchResult], mut w: impl Write, color: bool) -> Result<()> {
    for item in results {
        let id = apply_color(&item.id, color, AnsiColor::Cyan);
        writeln!(w, "{id}  {}", item.name)?;
    }
    Ok(())
}

fn write_result_columns(results: &[SearchResult], mut w: impl Write, color: bool) -> Result<()> {
    let id_width = column_width(results.iter().map(|r| r.id.len()), 60);
    let name_width = column_width(results.iter().map(|r| r.name.len()), 48);

    for item in results {
        let padded_id = format!("{:<id_width$}", item.id);
        let padded_name = format!("{:<name_width$}", item.name);
        let details = format!(
            "{:>4}  {:<9}  {:<16}  {}",
            item.score,
            item.match_type.as_str(),
            item.source_name,
            item.license
        );

        let rendered_id = apply_color(&padded_id, color, AnsiColor::Cyan);
        let rendered_name = apply_color(&padded_name, color, AnsiColor::Yellow);
        let rendered_details = apply_color(&details, color, AnsiColor::Green);
        writeln!(w, "{rendered_id}  {rendered_name}  {rendered_details}")?;
    }

    Ok(())
}

fn write_match_plain(rows: &[MatchRow<'_>], mut w: impl Write, color: bool) -> Result<()> {
    for row in rows {
        let family = apply_color(row.family, color, AnsiColor::Yellow);
        match row.found {
            Some(found) => {
                let id = apply_color(&found.font_id, color, AnsiColor::Cyan);
                writeln!(w, "{family}  {id}  {}", found.license)?;
            }
            None => writeln!(w, "{family}  -")?,
        }
    }
    Ok(())
}

fn write_match_columns(rows: &[MatchRow<'_>], mut w: impl Write, color: bool) -> Result<()> {
    let family_width = column_width(rows.iter().map(|r| r.family.len()), 48);
    let id_width = column_width(
        rows.iter()
            .map(|r| r.found.map_or(1, |found| found.font_id.len())),
        60,
    );

    for row in rows {
        let (id, details) = match row.found {
            Some(found) => (
                found.font_id.as_str(),
                format!("{:<16}  {}", found.source, found.license),
            ),
            None => ("-", String::new()),
        };
        let padded_family = format!("{:<family_width$}", row.family);
        let padded_id = format!("{:<id_width$}", id);

        let rendered_family = apply_color(&padded_family, color, AnsiColor::Yellow);
        let rendered_id = apply_color(&padded_id, color, AnsiColor::Cyan);
        let rendered_details = apply_color(&details, color, AnsiColor::Green);
        writeln!(w, "{rendered_family}  {rendered_id}  {rendered_details}")?;
    }

    Ok(())
}

fn write_cache_status(entries: &[CacheEntryStatus], mut w: impl Write) -> Result<()> {
    let id_width = column_width(entries.iter().map(|e| e.source_id.len()), 40);
    for entry in entries {
        let state = match (entry.valid, entry.fresh) {
            (false, _) => "invalid",
            (true, true) => "fresh",
            (true, false) => "expired",
        };
        let age = entry.age.map_or_else(|| "?".to_string(), format_age);
        writeln!(
            w,
            "{:<id_width$}  {:>9}  {:>8}  {state}",
            entry.source_id,
            format_size(entry.size),
            age
        )?;
    }
    Ok(())
}

fn column_width(lengths: impl Iterator<Item = usize>, max: usize) -> usize {
    lengths.max().unwrap_or(0).clamp(0, max)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        s if s >= 86_400 => format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600),
        s if s >= 3_600 => format!("{}h {}m", s / 3_600, (s % 3_600) / 60),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}
