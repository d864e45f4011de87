//! Reconcile installed font families with catalog entries (made by FontLab https://www.fontlab.com/)

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{FontEntry, Manifest, SourceCatalog};
use crate::error::CatalogError;
use crate::matching::normalize_name;
use crate::store::{ManifestReport, ManifestStore, RefreshPolicy};

const NERD_MARKERS: [&str; 3] = [" nerd font", "nerdfont", " nerd"];
const VARIANT_SUFFIXES: [&str; 3] = ["nl", "propo", "proportional"];

/// Provenance recovered for one installed family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFontMatch {
    pub font_id: String,
    /// Catalog display name of the matched entry.
    pub name: String,
    pub license: String,
    pub categories: Vec<String>,
    /// Source id.
    pub source: String,
}

/// Matches with the manifest report they were computed from.
#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: BTreeMap<String, InstalledFontMatch>,
    pub report: ManifestReport,
}

#[derive(Clone, Copy)]
struct Candidate<'a> {
    catalog: &'a SourceCatalog,
    font: &'a FontEntry,
}

impl Candidate<'_> {
    fn rank(&self) -> (usize, &str) {
        (self.catalog.priority, self.font.id.as_str())
    }

    fn is_nerd_source(&self) -> bool {
        [&self.catalog.id, &self.catalog.prefix, &self.catalog.name]
            .iter()
            .any(|label| label.to_lowercase().contains("nerd"))
    }

    fn to_match(self) -> InstalledFontMatch {
        InstalledFontMatch {
            font_id: self.font.id.clone(),
            name: self.font.name.clone(),
            license: self.font.license.clone(),
            categories: self.font.categories.clone(),
            source: self.catalog.id.clone(),
        }
    }
}

/// Normalized name and ID indexes over one manifest, candidates sorted best first.
struct FontIndex<'a> {
    by_name: HashMap<String, Vec<Candidate<'a>>>,
    by_id_name: HashMap<String, Vec<Candidate<'a>>>,
}

impl<'a> FontIndex<'a> {
    fn build(manifest: &'a Manifest) -> Self {
        let mut by_name: HashMap<String, Vec<Candidate<'a>>> = HashMap::new();
        let mut by_id_name: HashMap<String, Vec<Candidate<'a>>> = HashMap::new();

        for (catalog, font) in manifest.entries() {
            let candidate = Candidate { catalog, font };
            by_name
                .entry(normalize_name(&font.name))
                .or_default()
                .push(candidate);
            by_id_name
                .entry(normalize_name(font.id_name()))
                .or_default()
                .push(candidate);
        }
        for list in by_name.values_mut().chain(by_id_name.values_mut()) {
            list.sort_by(|a, b| a.rank().cmp(&b.rank()));
        }

        Self {
            by_name,
            by_id_name,
        }
    }

    fn lookup(&self, family: &str) -> Option<Candidate<'a>> {
        let normalized = normalize_name(family);
        let base = nerd_base_name(family);
        let wants_nerd = base.is_some() && family.to_lowercase().contains("nerd");

        for index in [&self.by_name, &self.by_id_name] {
            if let Some(found) = index
                .get(&normalized)
                .and_then(|list| pick(list, wants_nerd, false))
            {
                return Some(found);
            }
        }

        // a stripped base name is only trusted from the source the suffix points at
        let base = normalize_name(&base?);
        [&self.by_id_name, &self.by_name]
            .into_iter()
            .find_map(|index| index.get(&base).and_then(|list| pick(list, wants_nerd, wants_nerd)))
    }
}

/// Best candidate, preferring a Nerd Fonts source when hinted.
fn pick<'a>(list: &[Candidate<'a>], prefer_nerd: bool, require_nerd: bool) -> Option<Candidate<'a>> {
    if prefer_nerd {
        if let Some(found) = list.iter().find(|c| c.is_nerd_source()) {
            return Some(*found);
        }
        if require_nerd {
            return None;
        }
    }
    list.first().copied()
}

/// Strip Nerd Font markers and variant suffixes; `None` when nothing was stripped.
///
/// `"JetBrainsMonoNL Nerd Font Mono"` becomes `"JetBrainsMono"`.
pub fn nerd_base_name(family: &str) -> Option<String> {
    let trimmed = family.trim();
    // ASCII folding keeps byte offsets aligned with `trimmed`; the markers are ASCII.
    let lower = trimmed.to_ascii_lowercase();

    let mut base = trimmed.to_string();
    for marker in NERD_MARKERS {
        if let Some(idx) = lower.find(marker).filter(|idx| *idx > 0) {
            base = trimmed[..idx].trim_end().to_string();
            break;
        }
    }

    for suffix in VARIANT_SUFFIXES {
        let base_lower = base.to_ascii_lowercase();
        if base_lower.len() > suffix.len() && base_lower.ends_with(suffix) {
            let cut = base.len() - suffix.len();
            base = base[..cut].trim_end().to_string();
        }
    }

    (!base.is_empty() && base != trimmed).then_some(base)
}

/// Finds the catalog entry behind each installed family name.
#[derive(Debug, Clone, Default)]
pub struct InstalledFontMatcher;

impl InstalledFontMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Match every distinct family against `manifest`.
    ///
    /// Families for which `is_critical` holds are never matched. Families
    /// without a confident match are absent from the map. Ties between
    /// sources go to the higher-priority source, then to the lower font id.
    pub fn match_all<I, S>(
        &self,
        manifest: &Manifest,
        families: I,
        is_critical: impl Fn(&str) -> bool,
    ) -> BTreeMap<String, InstalledFontMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = FontIndex::build(manifest);
        log::debug!(
            "matching index: {} names, {} ids",
            index.by_name.len(),
            index.by_id_name.len()
        );

        let mut matches = BTreeMap::new();
        let mut requested = 0usize;
        for family in families {
            let family = family.as_ref().trim();
            if family.is_empty() || matches.contains_key(family) {
                continue;
            }
            requested += 1;
            if is_critical(family) {
                continue;
            }
            if let Some(found) = index.lookup(family) {
                matches.insert(family.to_string(), found.to_match());
            }
        }

        log::info!("matched {} of {requested} installed families", matches.len());
        matches
    }

    /// Obtain a manifest from `store` and match against it.
    pub fn match_store<I, S>(
        &self,
        store: &ManifestStore,
        policy: RefreshPolicy,
        families: I,
        is_critical: impl Fn(&str) -> bool,
    ) -> Result<MatchOutcome, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let report = store.get(policy).map_err(CatalogError::unavailable)?;
        let matches = self.match_all(&report.manifest, families, is_critical);
        Ok(MatchOutcome { matches, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceConfig;
    use crate::system_fonts::is_critical_system_font;
    use chrono::Utc;

    fn catalog(id: &str, prefix: &str, priority: usize, doc: &str) -> SourceCatalog {
        let source = SourceConfig::new(id, id, prefix, format!("mem://{id}"));
        SourceCatalog::from_document(&source, priority, doc.as_bytes().to_vec(), Utc::now())
            .expect("catalog")
    }

    fn manifest() -> Manifest {
        Manifest::new([
            catalog(
                "nerdfonts",
                "nerd",
                1,
                r#"{
                    "roboto": {"name": "Roboto", "license": "Apache-2.0"},
                    "jetbrains-mono": {"name": "JetBrains Mono", "license": "OFL"},
                    "fira-code": {"name": "FiraCode", "license": "OFL"}
                }"#,
            ),
            catalog(
                "google",
                "google",
                0,
                r#"{
                    "roboto": {"name": "Roboto", "license": "OFL", "categories": ["Sans Serif"]},
                    "jetbrains-mono": {"name": "JetBrains Mono", "license": "OFL"},
                    "open-sans": {"name": "Open Sans", "license": "OFL"},
                    "arial-alt": {"name": "Arial", "license": "OFL"}
                }"#,
            ),
        ])
    }

    #[test]
    fn higher_priority_source_wins() {
        let matches = InstalledFontMatcher::new().match_all(&manifest(), ["Roboto"], |_| false);
        let found = &matches["Roboto"];
        assert_eq!(found.source, "google");
        assert_eq!(found.font_id, "google.roboto");
        assert_eq!(found.categories, vec!["Sans Serif".to_string()]);
    }

    #[test]
    fn normalized_names_and_ids_both_match() {
        let matches = InstalledFontMatcher::new().match_all(
            &manifest(),
            ["open_sans", "OPEN-SANS", "Unknown Family"],
            |_| false,
        );
        assert_eq!(matches.len(), 2);
        assert!(!matches.contains_key("Unknown Family"));
    }

    #[test]
    fn critical_fonts_are_never_matched() {
        let matches =
            InstalledFontMatcher::new().match_all(&manifest(), ["Arial", "Roboto"], is_critical_system_font);
        assert!(!matches.contains_key("Arial"));
        assert!(matches.contains_key("Roboto"));
    }

    #[test]
    fn nerd_font_families_prefer_the_nerd_source() {
        let matches = InstalledFontMatcher::new().match_all(
            &manifest(),
            ["JetBrainsMono Nerd Font", "JetBrainsMonoNL Nerd Font Mono", "FiraCode Nerd Font Propo"],
            |_| false,
        );
        assert_eq!(matches["JetBrainsMono Nerd Font"].font_id, "nerd.jetbrains-mono");
        assert_eq!(matches["JetBrainsMonoNL Nerd Font Mono"].source, "nerdfonts");
        assert_eq!(matches["FiraCode Nerd Font Propo"].font_id, "nerd.fira-code");
    }

    #[test]
    fn base_names_are_extracted() {
        assert_eq!(
            nerd_base_name("JetBrainsMono Nerd Font").as_deref(),
            Some("JetBrainsMono")
        );
        assert_eq!(
            nerd_base_name("JetBrainsMonoNL Nerd Font Mono").as_deref(),
            Some("JetBrainsMono")
        );
        assert_eq!(nerd_base_name("Hack NerdFont").as_deref(), Some("Hack"));
        assert_eq!(nerd_base_name("Roboto"), None);
    }

    #[test]
    fn base_names_keep_non_ascii_text_intact() {
        assert_eq!(
            nerd_base_name("\u{212A}\u{212A}\u{e9} Nerd Font").as_deref(),
            Some("\u{212A}\u{212A}\u{e9}")
        );
        assert_eq!(
            nerd_base_name("\u{130}stanbul Nerd Font").as_deref(),
            Some("\u{130}stanbul")
        );
        assert_eq!(
            nerd_base_name("\u{dc}ber NL Nerd Font Mono").as_deref(),
            Some("\u{dc}ber")
        );
    }

    #[test]
    fn non_ascii_nerd_families_do_not_panic() {
        let families = ["\u{212A}\u{212A}\u{e9} Nerd Font", "\u{130}\u{130}\u{130} Nerd Font Propo"];
        let matches = InstalledFontMatcher::new().match_all(&Manifest::default(), families, |_| false);
        assert!(matches.is_empty());

        let matches = InstalledFontMatcher::new().match_all(&manifest(), families, |_| false);
        assert!(matches.is_empty());
    }

    #[test]
    fn matching_is_idempotent() {
        let manifest = manifest();
        let families = ["Roboto", "JetBrains Mono", "Hack Nerd Font", "Open Sans"];
        let matcher = InstalledFontMatcher::new();
        let first = matcher.match_all(&manifest, families, |_| false);
        let second = matcher.match_all(&manifest, families, |_| false);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_manifest_matches_nothing() {
        let matches = InstalledFontMatcher::new().match_all(&Manifest::default(), ["Roboto"], |_| false);
        assert!(matches.is_empty());
    }
}
