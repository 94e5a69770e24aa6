//! Fallback scorer that needs no external service.
//!
//! Output carries no relevance information; it exists so the record schema
//! stays stable when the hosted scorer is unconfigured or failing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{CandidateItem, MOCK_BRIEF, ScoreOrigin, ScoredItem, Sentiment, is_relevant};

/// Sub-score assigned to every mocked record.
pub const MOCK_SUB_SCORE: u8 = 5;

/// Mock scores are drawn from `[4.0, 9.0]` in steps of 0.1.
const MOCK_SCORE_TENTHS: std::ops::RangeInclusive<u32> = 40..=90;

#[derive(Debug, Clone)]
pub struct MockScorer<R = StdRng> {
    rng: R,
}

impl MockScorer<StdRng> {
    /// Deterministic output for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl<R: Rng> MockScorer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One record per item, in input order.  No gate is applied here.
    pub fn score(&mut self, items: &[CandidateItem]) -> Vec<ScoredItem> {
        items.iter().map(|item| self.score_one(item)).collect()
    }

    pub fn score_one(&mut self, item: &CandidateItem) -> ScoredItem {
        let score = f64::from(self.rng.gen_range(MOCK_SCORE_TENTHS)) / 10.0;
        let sentiment = Sentiment::ALL[self.rng.gen_range(0..Sentiment::ALL.len())];

        ScoredItem {
            item: item.clone(),
            signal: item.original_headline.clone(),
            sentiment,
            utility_score: MOCK_SUB_SCORE,
            novelty_score: MOCK_SUB_SCORE,
            impact_score: MOCK_SUB_SCORE,
            score,
            relevant: is_relevant(score),
            brief: MOCK_BRIEF.to_string(),
            origin: ScoreOrigin::Mock,
        }
    }
}
