use serde::{Deserialize, Serialize};

/// Signals longer than this many characters are replaced by the headline.
pub const MAX_SIGNAL_CHARS: usize = 200;

/// Scores strictly above this value are relevant; exactly 7.5 is not.
pub const RELEVANCE_THRESHOLD: f64 = 7.5;

pub const FILTERED_BRIEF: &str = "Filtered: Low keyword density (quota saving).";
pub const ERROR_BRIEF: &str = "Error: Scoring skipped or API mismatch.";
pub const MOCK_BRIEF: &str = "API Unavailable. Mock data.";

/// A raw headline from the search provider, not yet scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Headline and snippet joined; the keyword gate and the scorer read this.
    #[serde(default)]
    pub text: String,
    pub original_headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl CandidateItem {
    pub fn new(text: impl Into<String>, original_headline: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            original_headline: original_headline.into(),
            snippet: None,
            source: None,
            link: None,
            time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Case-insensitive parse of the labels the scorer is asked to use.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Which path produced a [`ScoredItem`].
///
/// | Origin     | Produced by                                           |
/// |------------|-------------------------------------------------------|
/// | `live`     | the hosted scorer's reply, merged into the item       |
/// | `mock`     | the mock scorer (no credential, or the call failed)   |
/// | `filtered` | the keyword gate's immediate rejection                |
/// | `fallback` | gap fill for a missing or invalid reply entry         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreOrigin {
    Live,
    Mock,
    Filtered,
    Fallback,
}

/// One output record per [`CandidateItem`], whichever path scored it.
///
/// Every path fills the same fields, so the serialized shape never varies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: CandidateItem,
    pub signal: String,
    pub sentiment: Sentiment,
    pub utility_score: u8,
    pub novelty_score: u8,
    pub impact_score: u8,
    pub score: f64,
    pub relevant: bool,
    pub brief: String,
    pub origin: ScoreOrigin,
}

impl ScoredItem {
    /// Zero-score record used for gate rejections and gap fills.
    pub fn placeholder(item: &CandidateItem, origin: ScoreOrigin, brief: &str) -> Self {
        Self {
            item: item.clone(),
            signal: item.original_headline.clone(),
            sentiment: Sentiment::Neutral,
            utility_score: 0,
            novelty_score: 0,
            impact_score: 0,
            score: 0.0,
            relevant: false,
            brief: brief.to_string(),
            origin,
        }
    }

    /// Record for an item the keyword gate rejected.
    pub fn filtered(item: &CandidateItem) -> Self {
        Self::placeholder(item, ScoreOrigin::Filtered, FILTERED_BRIEF)
    }

    /// Record for a passing item the scorer's reply did not cover.
    pub fn fallback(item: &CandidateItem) -> Self {
        Self::placeholder(item, ScoreOrigin::Fallback, ERROR_BRIEF)
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `utility * 0.4 + novelty * 0.3 + impact * 0.3`, rounded to one decimal.
///
/// Computed in tenths so integer inputs give exact results.
pub fn weighted_score(utility: u8, novelty: u8, impact: u8) -> f64 {
    let tenths = 4 * u32::from(utility) + 3 * u32::from(novelty) + 3 * u32::from(impact);
    round1(f64::from(tenths) / 10.0)
}

pub fn is_relevant(score: f64) -> bool {
    score > RELEVANCE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> CandidateItem {
        CandidateItem {
            text: "Bank payment stock rally. Markets up.".to_string(),
            original_headline: "Bank payment stock rally".to_string(),
            snippet: Some("Markets up.".to_string()),
            source: Some("Reuters".to_string()),
            link: Some("https://example.com/a".to_string()),
            time: Some("2 hours ago".to_string()),
        }
    }

    // ── Weighted score ─────────────────────────────────────────────────────

    #[test]
    fn weighted_score_extremes() {
        assert_eq!(weighted_score(10, 10, 10), 10.0);
        assert_eq!(weighted_score(0, 0, 0), 0.0);
        assert_eq!(weighted_score(10, 0, 0), 4.0);
    }

    #[test]
    fn weighted_score_mixed() {
        // 7*0.4 + 8*0.3 + 9*0.3 = 2.8 + 2.4 + 2.7
        assert_eq!(weighted_score(7, 8, 9), 7.9);
        assert_eq!(weighted_score(5, 5, 5), 5.0);
    }

    // ── Relevance ──────────────────────────────────────────────────────────

    #[test]
    fn relevance_is_strictly_above_threshold() {
        assert!(!is_relevant(7.5));
        assert!(is_relevant(7.6));
        assert!(!is_relevant(0.0));
    }

    #[test]
    fn round1_rounds_half_away_from_zero() {
        assert_eq!(round1(7.25), 7.3);
        assert_eq!(round1(4.04), 4.0);
    }

    // ── Placeholders ───────────────────────────────────────────────────────

    #[test]
    fn filtered_record_keeps_metadata_and_zeroes_scores() {
        let record = ScoredItem::filtered(&item());
        assert_eq!(record.item, item());
        assert_eq!(record.signal, "Bank payment stock rally");
        assert_eq!(record.score, 0.0);
        assert!(!record.relevant);
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert_eq!(record.brief, FILTERED_BRIEF);
        assert_eq!(record.origin, ScoreOrigin::Filtered);
    }

    #[test]
    fn every_record_kind_serializes_to_the_same_keys() {
        use std::collections::BTreeSet;

        use crate::merge::merge_record;
        use crate::mock::MockScorer;
        use crate::request::ScorerRecord;

        let live = merge_record(
            &item(),
            ScorerRecord {
                signal: Some("Payments rally".to_string()),
                sentiment: Some(Sentiment::Positive),
                utility_score: 9,
                novelty_score: 8,
                impact_score: 8,
                score: None,
                brief: Some("brief".to_string()),
            },
        );
        let mock = MockScorer::seeded(1).score_one(&item());
        let keys = |record: &ScoredItem| {
            serde_json::to_value(record)
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect::<BTreeSet<_>>()
        };

        let live_keys = keys(&live);
        assert_eq!(keys(&ScoredItem::filtered(&item())), live_keys);
        assert_eq!(keys(&ScoredItem::fallback(&item())), live_keys);
        assert_eq!(keys(&mock), live_keys);
        assert!(live_keys.contains("relevant"));
        assert!(live_keys.contains("original_headline"));

        let filtered = serde_json::to_value(ScoredItem::filtered(&item())).unwrap();
        assert_eq!(filtered["link"], "https://example.com/a");
        assert_eq!(filtered["brief"], FILTERED_BRIEF);
    }

    #[test]
    fn sentiment_from_label_is_case_insensitive() {
        assert_eq!(Sentiment::from_label(" Positive "), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("mixed"), None);
    }
}
