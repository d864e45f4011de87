//! Name normalization and the ranked-tier matcher (made by FontLab https://www.fontlab.com/)
//!
//! Search ranking, installed-font reconciliation, and "did you mean"
//! suggestions all go through [`QueryText::classify`], so the tiers mean
//! the same thing everywhere.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Lowercase and drop whitespace, hyphens, and underscores.
///
/// `"Open Sans"`, `"open-sans"` and `"OPEN_SANS"` all become `"opensans"`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !(c.is_whitespace() || *c == '-' || *c == '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strength of a textual match, weakest first so `Ord` follows strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// One word of the query (longer than two characters) appears in the name.
    Word,
    Substring,
    Prefix,
    Exact,
}

/// Fixed score contribution of each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBonuses {
    pub exact: u32,
    pub prefix: u32,
    pub substring: u32,
    pub word: u32,
}

impl Default for TierBonuses {
    fn default() -> Self {
        Self {
            exact: 300,
            prefix: 200,
            substring: 100,
            word: 50,
        }
    }
}

impl TierBonuses {
    pub fn bonus(&self, tier: MatchTier) -> u32 {
        match tier {
            MatchTier::Exact => self.exact,
            MatchTier::Prefix => self.prefix,
            MatchTier::Substring => self.substring,
            MatchTier::Word => self.word,
        }
    }

    /// Smallest distance between neighbouring tiers, or `None` when the table
    /// is not strictly decreasing from exact to word.
    pub fn min_gap(&self) -> Option<u32> {
        let ladder = [self.exact, self.prefix, self.substring, self.word];
        ladder
            .windows(2)
            .map(|pair| pair[0].checked_sub(pair[1]).filter(|gap| *gap > 0))
            .try_fold(u32::MAX, |acc, gap| gap.map(|g| acc.min(g)))
    }
}

/// A query prepared once and classified against many candidate names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    normalized: String,
    words: Vec<String>,
}

impl QueryText {
    pub fn new(raw: &str) -> Self {
        let words = raw
            .split_whitespace()
            .map(normalize_name)
            .filter(|word| word.chars().count() > 2)
            .collect();
        Self {
            normalized: normalize_name(raw),
            words,
        }
    }

    /// True when nothing matchable is left after normalization.
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Length in characters of the normalized query.
    pub fn len(&self) -> usize {
        self.normalized.chars().count()
    }

    /// Tier of the match against an already normalized candidate.
    pub fn classify_normalized(&self, candidate: &str) -> Option<MatchTier> {
        if self.is_empty() || candidate.is_empty() {
            return None;
        }
        if candidate == self.normalized {
            Some(MatchTier::Exact)
        } else if candidate.starts_with(&self.normalized) {
            Some(MatchTier::Prefix)
        } else if candidate.contains(&self.normalized) {
            Some(MatchTier::Substring)
        } else if self.words.iter().any(|word| candidate.contains(word.as_str())) {
            Some(MatchTier::Word)
        } else {
            None
        }
    }

    pub fn classify(&self, candidate: &str) -> Option<MatchTier> {
        self.classify_normalized(&normalize_name(candidate))
    }
}

/// Convenience wrapper for one-off comparisons.
pub fn classify(query: &str, candidate: &str) -> Option<MatchTier> {
    QueryText::new(query).classify(candidate)
}

/// Up to `limit` candidates that resemble `query`, strongest tier first.
///
/// Within a tier, names closer in length to the query come first. A
/// candidate contained in the query ("Roboto" for "robotomono") counts as a
/// word match. Duplicates by normalized name are dropped.
pub fn similar_names<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = QueryText::new(query);
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut ranked: Vec<(MatchTier, usize, String)> = Vec::new();
    for candidate in candidates {
        let normalized = normalize_name(candidate);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        let tier = query.classify_normalized(&normalized).or_else(|| {
            (normalized.chars().count() > 2 && query.normalized().contains(normalized.as_str()))
                .then_some(MatchTier::Word)
        });
        if let Some(tier) = tier {
            let distance = normalized.chars().count().abs_diff(query.len());
            ranked.push((tier, distance, candidate.to_string()));
        }
    }

    ranked.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.to_lowercase().cmp(&b.2.to_lowercase()))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, name)| name)
        .collect()
}
