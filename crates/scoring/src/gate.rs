use std::sync::Arc;

use tracing::{debug, info};

use crate::types::{CandidateItem, ScoredItem};
use crate::vocabulary::KeywordVocabulary;

pub const DEFAULT_KEYWORD_THRESHOLD: usize = 3;

/// Result of running the keyword gate over one batch.
///
/// Indices refer to positions in the input slice and keep input order.
#[derive(Debug, Clone, Default)]
pub struct GatePartition {
    /// Items worth sending to the scorer.
    pub passed: Vec<usize>,
    /// Items rejected for low keyword density, with their finished records.
    pub filtered: Vec<(usize, ScoredItem)>,
}

/// Keyword-density filter in front of the scorer.
#[derive(Debug, Clone)]
pub struct KeywordGate {
    vocabulary: Arc<KeywordVocabulary>,
    threshold: usize,
}

impl KeywordGate {
    pub fn new(vocabulary: Arc<KeywordVocabulary>, threshold: usize) -> Self {
        Self {
            vocabulary,
            threshold,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn vocabulary(&self) -> &KeywordVocabulary {
        &self.vocabulary
    }

    pub fn passes(&self, item: &CandidateItem) -> bool {
        self.vocabulary.count_matches(&item.text) >= self.threshold
    }

    /// Split `items` into scorer-bound and rejected.  The sector is only
    /// used for logging.
    pub fn partition(&self, sector: &str, items: &[CandidateItem]) -> GatePartition {
        let mut partition = GatePartition::default();

        for (i, item) in items.iter().enumerate() {
            let matches = self.vocabulary.count_matches(&item.text);
            if matches >= self.threshold {
                partition.passed.push(i);
            } else {
                debug!(index = i, matches, "headline filtered by keyword gate");
                partition.filtered.push((i, ScoredItem::filtered(item)));
            }
        }

        info!(
            sector,
            passed = partition.passed.len(),
            total = items.len(),
            threshold = self.threshold,
            "keyword gate applied"
        );
        partition
    }
}
