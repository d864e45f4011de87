//! Catalog data model and source document parsing (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::sources::SourceConfig;

/// One font family as published by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontEntry {
    /// Source-qualified identifier, e.g. `google.roboto`.
    pub id: String,
    pub name: String,
    /// First entry is the primary category.
    pub categories: Vec<String>,
    pub license: String,
    /// Variant label to download URL.
    pub files: BTreeMap<String, String>,
    pub popularity: u32,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
}

impl FontEntry {
    /// The part of the ID after the source prefix (`roboto` for `google.roboto`).
    pub fn id_name(&self) -> &str {
        self.id
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.id)
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

/// One source's fonts plus the source-level metadata they were loaded under.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCatalog {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub url: String,
    pub enabled: bool,
    /// Position in the configured priority order; 0 is the most preferred source.
    pub priority: usize,
    pub fonts: BTreeMap<String, FontEntry>,
    /// When this copy was fetched, or when its cache file was written.
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    raw: Arc<[u8]>,
}

impl SourceCatalog {
    /// Parse a source document exactly as it was received.
    ///
    /// The raw bytes are kept so the cache can persist them without
    /// re-encoding.
    pub fn from_document(
        source: &SourceConfig,
        priority: usize,
        raw: impl Into<Arc<[u8]>>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let raw: Arc<[u8]> = raw.into();
        let parsed = parse_document(&source.prefix, &raw)?;

        Ok(Self {
            id: source.id.clone(),
            name: parsed.display_name.unwrap_or_else(|| source.name.clone()),
            prefix: source.prefix.clone(),
            url: source.url.clone(),
            enabled: source.enabled,
            priority,
            fonts: parsed.fonts,
            updated_at,
            raw,
        })
    }

    /// The document bytes this catalog was parsed from.
    pub fn raw_document(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Case-insensitive match against id, display name, or prefix.
    pub fn answers_to(&self, label: &str) -> bool {
        let label = label.trim();
        self.id.eq_ignore_ascii_case(label)
            || self.name.eq_ignore_ascii_case(label)
            || self.prefix.eq_ignore_ascii_case(label)
    }
}

/// Immutable union of every source catalog loaded by one `ManifestStore::get`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
    sources: BTreeMap<String, SourceCatalog>,
    last_updated: Option<DateTime<Utc>>,
}

impl Manifest {
    pub fn new(catalogs: impl IntoIterator<Item = SourceCatalog>) -> Self {
        let sources: BTreeMap<String, SourceCatalog> = catalogs
            .into_iter()
            .map(|catalog| (catalog.id.clone(), catalog))
            .collect();
        let last_updated = sources.values().map(|c| c.updated_at).max();
        Self {
            sources,
            last_updated,
        }
    }

    /// Most recent fetch or cache time among the catalogs used.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn source(&self, id: &str) -> Option<&SourceCatalog> {
        self.sources.get(id)
    }

    /// Catalogs from most to least preferred.
    pub fn sources(&self) -> Vec<&SourceCatalog> {
        let mut ordered: Vec<&SourceCatalog> = self.sources.values().collect();
        ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        ordered
    }

    /// Every font paired with its catalog, in source priority order.
    pub fn entries(&self) -> impl Iterator<Item = (&SourceCatalog, &FontEntry)> {
        self.sources()
            .into_iter()
            .flat_map(|catalog| catalog.fonts.values().map(move |font| (catalog, font)))
    }

    /// Look a font up by its full ID across all sources.
    pub fn find_font(&self, id: &str) -> Option<(&SourceCatalog, &FontEntry)> {
        self.entries()
            .find(|(_, font)| font.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn font_count(&self) -> usize {
        self.sources.values().map(SourceCatalog::len).sum()
    }
}

struct ParsedDocument {
    display_name: Option<String>,
    fonts: BTreeMap<String, FontEntry>,
}

/// Collections may be `null` at any level; a null reads as empty.
#[derive(Debug, Deserialize)]
struct WireFont {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    categories: Option<Vec<Option<String>>>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    files: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    variants: Option<Vec<Option<WireVariant>>>,
    #[serde(default, deserialize_with = "de_popularity")]
    popularity: u32,
    #[serde(
        default,
        rename = "lastModified",
        alias = "last_modified",
        deserialize_with = "de_timestamp"
    )]
    last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "sourceUrl", alias = "source_url")]
    source_url: Option<String>,
    #[serde(default, rename = "metadataUrl", alias = "metadata_url")]
    metadata_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireVariant {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    files: Option<BTreeMap<String, Option<String>>>,
}

fn parse_document(prefix: &str, raw: &[u8]) -> Result<ParsedDocument, serde_json::Error> {
    let value: Value = serde_json::from_slice(raw)?;
    let Value::Object(top) = value else {
        return Err(serde_json::Error::custom(
            "catalog document must be a JSON object",
        ));
    };

    let (display_name, fonts) = split_envelope(top);
    let wire: BTreeMap<String, WireFont> = serde_json::from_value(Value::Object(fonts))?;

    let fonts = wire
        .into_iter()
        .map(|(key, font)| {
            let entry = font.into_entry(qualify_id(prefix, &key));
            (entry.id.clone(), entry)
        })
        .collect();

    Ok(ParsedDocument {
        display_name,
        fonts,
    })
}

/// Accept both a bare fonts map and the `{"source_info": .., "fonts": ..}` envelope.
fn split_envelope(mut top: Map<String, Value>) -> (Option<String>, Map<String, Value>) {
    let is_envelope = match top.get("fonts") {
        Some(Value::Object(inner)) => top.contains_key("source_info") || !inner.contains_key("name"),
        _ => false,
    };
    if !is_envelope {
        return (None, top);
    }

    let display_name = top
        .get("source_info")
        .and_then(|info| info.get("name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    match top.remove("fonts") {
        Some(Value::Object(fonts)) => (display_name, fonts),
        _ => (display_name, Map::new()),
    }
}

fn qualify_id(prefix: &str, key: &str) -> String {
    let key = key.trim();
    if prefix.is_empty() {
        return key.to_string();
    }
    let already = key
        .split_once('.')
        .is_some_and(|(head, _)| head.eq_ignore_ascii_case(prefix));
    if already {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

impl WireFont {
    fn into_entry(self, id: String) -> FontEntry {
        let name = self
            .name
            .or(self.family)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.split_once('.').map(|(_, r)| r).unwrap_or(&id).to_string());

        let mut files: BTreeMap<String, String> = self
            .files
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(label, url)| url.map(|url| (label, url)))
            .collect();
        if files.is_empty() {
            for variant in self.variants.unwrap_or_default().into_iter().flatten() {
                let variant_files: Vec<(String, String)> = variant
                    .files
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(format, url)| url.map(|url| (format, url)))
                    .collect();
                let single = variant_files.len() == 1;
                let variant_name = variant.name.filter(|n| !n.trim().is_empty());
                for (format, url) in variant_files {
                    let label = match (&variant_name, single) {
                        (Some(name), true) => name.clone(),
                        (Some(name), false) => format!("{name}.{format}"),
                        (None, _) => format,
                    };
                    files.entry(label).or_insert(url);
                }
            }
        }

        FontEntry {
            id,
            name,
            categories: self
                .categories
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            license: self.license.unwrap_or_default(),
            files,
            popularity: self.popularity,
            last_modified: self.last_modified,
            description: self.description.filter(|d| !d.is_empty()),
            source_url: self.source_url.filter(|u| !u.is_empty()),
            metadata_url: self.metadata_url.filter(|u| !u.is_empty()),
        }
    }
}

fn de_popularity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Number> = Option::deserialize(deserializer)?;
    let Some(number) = raw else {
        return Ok(0);
    };

    if let Some(value) = number.as_u64() {
        return Ok(value.min(u64::from(u32::MAX)) as u32);
    }
    if number.as_i64().is_some() {
        // only negative integers reach this point
        return Ok(0);
    }
    Ok(number
        .as_f64()
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => parse_timestamp(&text),
        Some(Value::Number(n)) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    })
}

/// RFC 3339, bare `YYYY-MM-DDTHH:MM:SS`, or `YYYY-MM-DD`; anything else is unknown.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    None
}
