//! Configuration loading for typcat (made by FontLab https://www.fontlab.com/)
//!
//! A small YAML file tunes the cache, network bounds, and ranking without a
//! rebuild. Every key is optional:
//!
//! ```yaml
//! cache:
//!   dir: ~/.cache/typcat/sources
//!   ttl: 24h
//! network:
//!   request_timeout: 10s
//! limits:
//!   max_source_size: 50MB
//! search:
//!   enable_popularity_sort: true
//!   popularity_cap: 49
//! sources:
//!   - id: google-fonts
//!     name: Google Fonts
//!     prefix: google
//!     url: https://example.com/google-fonts.json
//!     priority: 1
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::sources::{default_sources, order_enabled, SourceConfig, SourceProvider};

/// Env var naming an alternative config file.
pub const CONFIG_ENV: &str = "TYPCAT_CONFIG";
/// Env var overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "TYPCAT_CACHE_DIR";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_SOURCE_SIZE: u64 = 50 * 1024 * 1024;
/// One below the smallest gap between adjacent match-tier bonuses.
pub const DEFAULT_POPULARITY_CAP: u32 = 49;

/// Resolved, typed settings used to construct the store and search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub max_source_size: u64,
    pub enable_popularity_sort: bool,
    pub popularity_cap: u32,
    pub sources: Vec<SourceConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
            enable_popularity_sort: true,
            popularity_cap: DEFAULT_POPULARITY_CAP,
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    cache: CacheSection,
    network: NetworkSection,
    limits: LimitsSection,
    search: SearchSection,
    sources: Option<Vec<SourceConfig>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CacheSection {
    dir: Option<PathBuf>,
    ttl: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NetworkSection {
    request_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LimitsSection {
    max_source_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SearchSection {
    enable_popularity_sort: Option<bool>,
    popularity_cap: Option<u32>,
}

impl CatalogConfig {
    /// Parse YAML text, filling unspecified keys with defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml_ng::from_str(text).context("parsing typcat config")?
        };

        let mut config = CatalogConfig::default();

        if let Some(dir) = file.cache.dir {
            config.cache_dir = expand_home(&dir);
        }
        if let Some(raw) = file.cache.ttl {
            config.cache_ttl =
                parse_duration(&raw).with_context(|| format!("cache.ttl = {raw:?}"))?;
        }
        if let Some(raw) = file.network.request_timeout {
            config.request_timeout = parse_duration(&raw)
                .with_context(|| format!("network.request_timeout = {raw:?}"))?;
            if config.request_timeout.is_zero() {
                return Err(anyhow!("network.request_timeout must be greater than zero"));
            }
        }
        if let Some(raw) = file.limits.max_source_size {
            config.max_source_size = parse_size(&raw)
                .with_context(|| format!("limits.max_source_size = {raw:?}"))?;
            if config.max_source_size == 0 {
                return Err(anyhow!("limits.max_source_size must be greater than zero"));
            }
        }
        if let Some(enabled) = file.search.enable_popularity_sort {
            config.enable_popularity_sort = enabled;
        }
        if let Some(cap) = file.search.popularity_cap {
            config.popularity_cap = cap;
        }
        if let Some(sources) = file.sources {
            order_enabled(&sources).context("invalid sources list")?;
            config.sources = sources;
        }

        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {}", path.display()))
    }

    /// Load from `TYPCAT_CONFIG` or the platform config dir, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut config = Self::load(&default_config_path())?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an env-like lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.cache_dir = expand_home(Path::new(dir.trim()));
        }
    }
}

impl SourceProvider for CatalogConfig {
    fn enabled_sources(&self) -> Result<Vec<SourceConfig>> {
        order_enabled(&self.sources)
    }
}

/// Config file location, honoring `TYPCAT_CONFIG`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("typcat"))
        .unwrap_or_else(|| PathBuf::from(".typcat"))
        .join("config.yaml")
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("typcat"))
        .unwrap_or_else(|| PathBuf::from(".typcat"))
        .join("sources")
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Parse `1500ms`, `10s`, `5m`, `24h`, `7d`; a bare number means seconds.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?i)\s*(\d+)\s*(ms|s|m|h|d)?\s*$").expect("duration pattern compiles")
    });

    let caps = re
        .captures(raw)
        .ok_or_else(|| anyhow!("invalid duration: {raw} (expected e.g. 10s, 24h)"))?;
    let value: u64 = caps[1]
        .parse()
        .map_err(|_| anyhow!("duration out of range: {raw}"))?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "s".to_string());

    let secs = |mult: u64| {
        value
            .checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow!("duration out of range: {raw}"))
    };

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => secs(1),
        "m" => secs(60),
        "h" => secs(60 * 60),
        "d" => secs(24 * 60 * 60),
        _ => Err(anyhow!("invalid duration unit in {raw}")),
    }
}

/// Parse `50MB`, `512KB`, `1G`, `2048`; units are binary (1KB = 1024 bytes).
pub fn parse_size(raw: &str) -> Result<u64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?i)\s*(\d+)\s*(b|k|kb|m|mb|g|gb)?\s*$").expect("size pattern compiles")
    });

    let caps = re
        .captures(raw)
        .ok_or_else(|| anyhow!("invalid size: {raw} (expected e.g. 50MB)"))?;
    let value: u64 = caps[1]
        .parse()
        .map_err(|_| anyhow!("size out of range: {raw}"))?;
    let mult: u64 = match caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("b") => 1,
        Some("k") | Some("kb") => 1024,
        Some("m") | Some("mb") => 1024 * 1024,
        Some("g") | Some("gb") => 1024 * 1024 * 1024,
        Some(other) => return Err(anyhow!("invalid size unit {other} in {raw}")),
    };

    value
        .checked_mul(mult)
        .ok_or_else(|| anyhow!("size out of range: {raw}"))
}
