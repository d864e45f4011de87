//! Font source definitions and the enabled-source provider (made by FontLab https://www.fontlab.com/)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Base location of the FontGet-Sources catalogs.
pub const SOURCES_BASE_URL: &str =
    "https://raw.githubusercontent.com/Graphixa/FontGet-Sources/main/sources";

/// One remote catalog as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable key, also used to name the cache file.
    pub id: String,
    /// Human-facing display name ("Google Fonts").
    pub name: String,
    /// Short alias used in font IDs ("google" in `google.roboto`).
    pub prefix: String,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower is preferred. When absent, list position decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        prefix: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prefix: prefix.into(),
            url: url.into(),
            enabled: true,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn enabled(mut self, yes: bool) -> Self {
        self.enabled = yes;
        self
    }

    /// Case-insensitive match against id, display name, or prefix.
    pub fn answers_to(&self, label: &str) -> bool {
        let label = label.trim();
        self.id.eq_ignore_ascii_case(label)
            || self.name.eq_ignore_ascii_case(label)
            || self.prefix.eq_ignore_ascii_case(label)
    }
}

/// The three catalogs typcat ships with, highest priority first.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "google-fonts",
            "Google Fonts",
            "google",
            format!("{SOURCES_BASE_URL}/google-fonts.json"),
        )
        .with_priority(1),
        SourceConfig::new(
            "nerd-fonts",
            "Nerd Fonts",
            "nerd",
            format!("{SOURCES_BASE_URL}/nerd-fonts.json"),
        )
        .with_priority(2),
        SourceConfig::new(
            "font-squirrel",
            "Font Squirrel",
            "squirrel",
            format!("{SOURCES_BASE_URL}/font-squirrel.json"),
        )
        .with_priority(3),
    ]
}

/// Supplies the sources a manifest should be built from.
///
/// Implementations return only enabled sources, ordered from highest to
/// lowest priority. That order is the tie-break order for search ranking and
/// installed-font matching.
pub trait SourceProvider {
    fn enabled_sources(&self) -> Result<Vec<SourceConfig>>;
}

impl SourceProvider for Vec<SourceConfig> {
    fn enabled_sources(&self) -> Result<Vec<SourceConfig>> {
        order_enabled(self)
    }
}

impl SourceProvider for [SourceConfig] {
    fn enabled_sources(&self) -> Result<Vec<SourceConfig>> {
        order_enabled(self)
    }
}

/// Keep enabled sources, sort by explicit priority and then by list position.
///
/// Sources without an explicit priority sort after every prioritized one.
pub fn order_enabled(sources: &[SourceConfig]) -> Result<Vec<SourceConfig>> {
    validate_sources(sources)?;

    let mut ranked: Vec<(u32, usize, &SourceConfig)> = sources
        .iter()
        .enumerate()
        .filter(|(_, source)| source.enabled)
        .map(|(pos, source)| (source.priority.unwrap_or(u32::MAX), pos, source))
        .collect();
    ranked.sort_by_key(|(priority, pos, _)| (*priority, *pos));

    Ok(ranked.into_iter().map(|(_, _, s)| s.clone()).collect())
}

/// File stem a source's cache record is stored under.
///
/// ASCII letters and digits are kept (lowercased), everything else becomes
/// `-`. Ids that reduce to nothing share the stem `source`.
pub fn cache_key(source_id: &str) -> String {
    let cleaned: String = source_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Ids must be non-empty and map to distinct cache files.
fn validate_sources(sources: &[SourceConfig]) -> Result<()> {
    let mut seen: Vec<(String, &str)> = Vec::with_capacity(sources.len());
    for source in sources {
        if source.id.trim().is_empty() {
            return Err(anyhow!("source with url {} has an empty id", source.url));
        }
        if source.url.trim().is_empty() {
            return Err(anyhow!("source {} has an empty url", source.id));
        }
        let key = cache_key(&source.id);
        if let Some((_, first)) = seen.iter().find(|(k, _)| *k == key) {
            return Err(if first.eq_ignore_ascii_case(&source.id) {
                anyhow!("source id {} is configured twice", source.id)
            } else {
                anyhow!(
                    "source ids {first} and {} share the cache file {key}.json",
                    source.id
                )
            });
        }
        seen.push((key, source.id.as_str()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_priority_order() {
        let ordered = default_sources().enabled_sources().expect("order");
        let ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["google-fonts", "nerd-fonts", "font-squirrel"]);
    }

    #[test]
    fn explicit_priority_beats_list_position() {
        let sources = vec![
            SourceConfig::new("b", "B", "b", "https://b"),
            SourceConfig::new("a", "A", "a", "https://a").with_priority(1),
            SourceConfig::new("c", "C", "c", "https://c"),
        ];
        let ordered = sources.enabled_sources().expect("order");
        let ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn disabled_sources_are_dropped() {
        let sources = vec![
            SourceConfig::new("a", "A", "a", "https://a").enabled(false),
            SourceConfig::new("b", "B", "b", "https://b"),
        ];
        let ordered = sources.enabled_sources().expect("order");
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, "b");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let sources = vec![
            SourceConfig::new("google", "Google", "google", "https://a"),
            SourceConfig::new("Google", "Google 2", "g2", "https://b"),
        ];
        assert!(sources.enabled_sources().is_err());
    }

    #[test]
    fn ids_sharing_a_cache_file_are_rejected() {
        let sources = vec![
            SourceConfig::new("google.fonts", "Google", "google", "https://a"),
            SourceConfig::new("google-fonts", "Google mirror", "gm", "https://b"),
        ];
        let err = sources.enabled_sources().expect_err("colliding cache files");
        let message = err.to_string();
        assert!(message.contains("google.fonts"), "{message}");
        assert!(message.contains("google-fonts.json"), "{message}");

        let blank = vec![
            SourceConfig::new("???", "A", "a", "https://a"),
            SourceConfig::new("!!!", "B", "b", "https://b"),
        ];
        assert!(blank.enabled_sources().is_err());
    }

    #[test]
    fn cache_keys_are_filesystem_safe() {
        assert_eq!(cache_key("Google Fonts"), "google-fonts");
        assert_eq!(cache_key("../../etc"), "etc");
        assert_eq!(cache_key("google.fonts"), cache_key("google-fonts"));
        assert_eq!(cache_key(" -- "), "source");
    }

    #[test]
    fn answers_to_id_name_and_prefix() {
        let source = &default_sources()[0];
        assert!(source.answers_to("google"));
        assert!(source.answers_to("Google Fonts"));
        assert!(source.answers_to("GOOGLE-FONTS"));
        assert!(!source.answers_to("nerd"));
    }
}
