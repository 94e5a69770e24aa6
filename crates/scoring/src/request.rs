//! Batched request to the hosted scorer and the contract its reply must meet.
//!
//! All gate-passing texts for a sector go out in one prompt.  The reply must
//! be a JSON array with one object per text, in request order.  Validation
//! happens at two levels:
//!
//! - **Batch**: a reply that is not JSON, is JSON but not an array, or holds
//!   an entry that is not an object fails the whole request ([`ScoringError`]).
//! - **Element**: an entry with missing sub-scores, out-of-range numbers or an
//!   unknown sentiment becomes a [`RecordError`] for that position only.

use serde_json::{Map, Value};
use tracing::{debug, info};

use signalboard_llm::{CompletionClient, extract_json_output};

use crate::error::{RecordError, ScoringError};
use crate::merge::merge_reply;
use crate::types::{CandidateItem, ScoredItem, Sentiment, round1, weighted_score};

const MAX_SUB_SCORE: f64 = 10.0;
const EXCERPT_CHARS: usize = 120;

/// One validated entry of the scorer's reply.
///
/// Optional fields are those the merge can fill from the original item or
/// from the sub-scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerRecord {
    pub signal: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub utility_score: u8,
    pub novelty_score: u8,
    pub impact_score: u8,
    /// Already rounded to one decimal.
    pub score: Option<f64>,
    pub brief: Option<String>,
}

impl ScorerRecord {
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;

        let score = match obj.get("score") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let score = raw
                    .as_f64()
                    .ok_or(RecordError::InvalidType { field: "score" })?;
                if !(0.0..=MAX_SUB_SCORE).contains(&score) {
                    return Err(RecordError::OutOfRange {
                        field: "score",
                        value: score,
                    });
                }
                Some(round1(score))
            }
        };

        let sentiment = match optional_str(obj, "sentiment")? {
            None => None,
            Some(label) => Some(
                Sentiment::from_label(label)
                    .ok_or_else(|| RecordError::InvalidSentiment(label.to_string()))?,
            ),
        };

        Ok(Self {
            signal: optional_str(obj, "signal")?.map(ToString::to_string),
            sentiment,
            utility_score: sub_score(obj, "utility_score")?,
            novelty_score: sub_score(obj, "novelty_score")?,
            impact_score: sub_score(obj, "impact_score")?,
            score,
            brief: optional_str(obj, "brief")?.map(ToString::to_string),
        })
    }

    /// The scorer's own score when it sent one, else the weighted formula.
    pub fn final_score(&self) -> f64 {
        self.score.unwrap_or_else(|| {
            weighted_score(self.utility_score, self.novelty_score, self.impact_score)
        })
    }
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RecordError::InvalidType { field }),
    }
}

/// Integer in `0..=10`.  Integral floats such as `7.0` are accepted.
fn sub_score(obj: &Map<String, Value>, field: &'static str) -> Result<u8, RecordError> {
    let value = obj
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or(RecordError::MissingField(field))?
        .as_f64()
        .ok_or(RecordError::InvalidType { field })?;

    if value.fract() != 0.0 || !(0.0..=MAX_SUB_SCORE).contains(&value) {
        return Err(RecordError::OutOfRange { field, value });
    }
    Ok(value as u8)
}

/// Build the batched scoring prompt for `texts`, in order.
pub fn build_prompt(sector: &str, texts: &[&str]) -> String {
    // Serializing a slice of &str cannot fail.
    let headlines = serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string());
    let count = texts.len();

    format!(
        "You are a Market Intelligence Analyst for the {sector} sector.
Analyze the following {count} headlines and return a JSON array of objects.

Headlines:
{headlines}

Return EXACTLY {count} objects, one per headline, in the same order as the input.
For EACH headline, provide:
1. \"signal\": A concise, punchy summary of the headline suitable for a dashboard card (at most 200 characters).
2. \"sentiment\": \"positive\", \"neutral\", or \"negative\".
3. \"utility_score\": integer 0-10 (Can this be turned into a product?)
4. \"novelty_score\": integer 0-10 (Is this new?)
5. \"impact_score\": integer 0-10 (Does this change the market?)
6. \"score\": Calculate weighted score: (utility_score * 0.4) + (novelty_score * 0.3) + (impact_score * 0.3). Round to 1 decimal.
7. \"relevant\": boolean (true if score > 7.5, else false).
8. \"brief\": A short 3-sentence briefing for a Product Manager about why this matters.

Return ONLY valid JSON."
    )
}

/// Parse a raw reply into per-position records.
///
/// The outer `Result` is the batch verdict; inner results are per element.
/// Length is whatever the scorer sent; reconciling it with the request is
/// the merger's job.
pub fn parse_reply(reply: &str) -> Result<Vec<Result<ScorerRecord, RecordError>>, ScoringError> {
    let value: Value =
        extract_json_output(reply).ok_or_else(|| ScoringError::MalformedResponse {
            excerpt: reply.chars().take(EXCERPT_CHARS).collect(),
        })?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(ScoringError::NotAnArray {
                kind: json_kind(&other),
            });
        }
    };

    if let Some((position, entry)) = entries.iter().enumerate().find(|(_, e)| !e.is_object()) {
        return Err(ScoringError::MalformedEntries {
            position,
            kind: json_kind(entry),
        });
    }

    Ok(entries.iter().map(ScorerRecord::from_value).collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sends one batch to the hosted scorer and merges the reply into the
/// originals.
pub struct ScoreRequester<'c> {
    client: &'c dyn CompletionClient,
}

impl<'c> ScoreRequester<'c> {
    pub fn new(client: &'c dyn CompletionClient) -> Self {
        Self { client }
    }

    /// Score `items` with a single call.
    ///
    /// On success the result has exactly `items.len()` records in input
    /// order; short or partly invalid replies are gap-filled.  Errors mean
    /// nothing usable came back.
    pub fn request(
        &self,
        sector: &str,
        items: &[&CandidateItem],
    ) -> Result<Vec<ScoredItem>, ScoringError> {
        let texts: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();
        let prompt = build_prompt(sector, &texts);

        info!(
            sector,
            batch = items.len(),
            client = self.client.name(),
            "requesting scores"
        );
        let reply = self
            .client
            .complete(&prompt)
            .map_err(|err| ScoringError::Transport {
                reason: format!("{err:#}"),
            })?;
        debug!(reply_len = reply.len(), "scorer replied");

        let records = parse_reply(&reply)?;
        Ok(merge_reply(items, records))
    }
}
