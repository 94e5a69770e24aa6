//! Positional reconciliation of scorer output with the original items.
//!
//! Whatever the scorer sends back, `output[i]` always describes `items[i]`
//! and every original field survives.  Scorer fields overlay the original;
//! fields the scorer omits fall back to the item itself.

use tracing::{debug, warn};

use crate::error::RecordError;
use crate::request::ScorerRecord;
use crate::types::{
    CandidateItem, MAX_SIGNAL_CHARS, ScoreOrigin, ScoredItem, Sentiment, is_relevant,
};

/// Overlay one validated scorer entry onto its original item.
///
/// `original_headline`, `source`, `link` and `time` come from the item and
/// are never overwritten.  A signal over [`MAX_SIGNAL_CHARS`] characters is
/// replaced by the headline.  `relevant` is derived from the final score.
pub fn merge_record(original: &CandidateItem, record: ScorerRecord) -> ScoredItem {
    let score = record.final_score();
    let signal = match record.signal {
        Some(signal) if signal.chars().count() > MAX_SIGNAL_CHARS => {
            debug!(
                chars = signal.chars().count(),
                "signal too long, using original headline"
            );
            original.original_headline.clone()
        }
        Some(signal) => signal,
        None => original.original_headline.clone(),
    };

    ScoredItem {
        item: original.clone(),
        signal,
        sentiment: record.sentiment.unwrap_or(Sentiment::Neutral),
        utility_score: record.utility_score,
        novelty_score: record.novelty_score,
        impact_score: record.impact_score,
        score,
        relevant: is_relevant(score),
        brief: record.brief.unwrap_or_default(),
        origin: ScoreOrigin::Live,
    }
}

/// Reconcile a parsed reply with the batch that was sent.
///
/// The result has exactly `sent.len()` records.  Missing positions and
/// entries that failed validation get the error-marked fallback record;
/// entries beyond the request length are dropped with a warning.
pub fn merge_reply(
    sent: &[&CandidateItem],
    mut records: Vec<Result<ScorerRecord, RecordError>>,
) -> Vec<ScoredItem> {
    if records.len() > sent.len() {
        warn!(
            expected = sent.len(),
            received = records.len(),
            "scorer returned more results than requested; ignoring extras"
        );
        records.truncate(sent.len());
    } else if records.len() < sent.len() {
        warn!(
            expected = sent.len(),
            received = records.len(),
            "scorer returned fewer results than requested; filling gaps"
        );
    }

    let mut records = records.into_iter();
    sent.iter()
        .enumerate()
        .map(|(i, original)| match records.next() {
            Some(Ok(record)) => merge_record(original, record),
            Some(Err(err)) => {
                warn!(index = i, %err, "invalid scorer entry; using fallback");
                ScoredItem::fallback(original)
            }
            None => ScoredItem::fallback(original),
        })
        .collect()
}

/// Place per-index records back into input order.
///
/// Any index left without a record gets the fallback record, so the output
/// length always equals `items.len()`.  Later records for an index replace
/// earlier ones.
pub fn assemble<I>(items: &[CandidateItem], records: I) -> Vec<ScoredItem>
where
    I: IntoIterator<Item = (usize, ScoredItem)>,
{
    let mut slots: Vec<Option<ScoredItem>> = vec![None; items.len()];
    for (index, record) in records {
        match slots.get_mut(index) {
            Some(slot) => *slot = Some(record),
            None => warn!(index, total = items.len(), "record index out of bounds"),
        }
    }

    slots
        .into_iter()
        .zip(items)
        .map(|(slot, item)| slot.unwrap_or_else(|| ScoredItem::fallback(item)))
        .collect()
}
