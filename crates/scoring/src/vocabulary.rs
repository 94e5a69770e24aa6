//! Shared keyword vocabulary for the keyword gate.
//!
//! The vocabulary is the deduplicated, lower-cased union of every sector's
//! keyword list.  It is built once at startup and only read afterwards; the
//! sector being scored does not narrow it.

use std::collections::{BTreeMap, BTreeSet};

const FINTECH_KEYWORDS: &[&str] = &[
    "payment", "bank", "crypto", "blockchain", "wallet", "transaction", "stock",
    "market", "sec", "regulation", "stripe", "visa", "upi", "lending", "finance",
    "money", "currency", "defi", "nft",
];

const EDTECH_KEYWORDS: &[&str] = &[
    "student", "learning", "course", "university", "skill", "degree", "campus",
    "online", "class", "tutor", "education", "school", "certificate", "training",
    "edtech",
];

const HEALTHCARE_KEYWORDS: &[&str] = &[
    "patient", "doctor", "drug", "vaccine", "hospital", "medicine", "care",
    "surgery", "biotech", "pharma", "health", "clinical", "therapy", "medical",
    "disease",
];

const AI_KEYWORDS: &[&str] = &[
    "ai", "llm", "model", "generative", "inference", "nvidia", "gpu",
    "transformer", "neural", "bot", "agent", "automation", "intelligence", "gpt",
    "gemini", "openai", "machine learning",
];

/// Built-in per-sector keyword lists.
pub fn builtin_sector_keywords() -> BTreeMap<String, Vec<String>> {
    [
        ("Fintech", FINTECH_KEYWORDS),
        ("EdTech", EDTECH_KEYWORDS),
        ("Healthcare", HEALTHCARE_KEYWORDS),
        ("AI", AI_KEYWORDS),
    ]
    .into_iter()
    .map(|(sector, words)| {
        (
            sector.to_string(),
            words.iter().map(|w| (*w).to_string()).collect(),
        )
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordVocabulary {
    keywords: BTreeSet<String>,
}

impl KeywordVocabulary {
    /// Union of the given keyword lists, lower-cased and trimmed.  Blank
    /// entries are dropped.
    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|kw| kw.as_ref().trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_sectors(sectors: &BTreeMap<String, Vec<String>>) -> Self {
        Self::from_keywords(sectors.values().flatten())
    }

    pub fn builtin() -> Self {
        Self::from_sectors(&builtin_sector_keywords())
    }

    /// Built-in lists unless `overrides` names at least one sector.
    pub fn from_config(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        if overrides.is_empty() {
            Self::builtin()
        } else {
            Self::from_sectors(overrides)
        }
    }

    /// Number of distinct keywords that occur as substrings of `text`,
    /// compared case-insensitively.  Repeats of one keyword count once.
    pub fn count_matches(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}
