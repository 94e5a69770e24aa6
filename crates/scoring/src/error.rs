use thiserror::Error;

/// Whole-batch failures of the scoring call.  Each one sends the batch to
/// the mock scorer.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring transport failed: {reason}")]
    Transport { reason: String },

    #[error("scorer reply is not valid JSON: {excerpt}")]
    MalformedResponse { excerpt: String },

    #[error("scorer reply is JSON but not an array (got {kind})")]
    NotAnArray { kind: &'static str },

    #[error("scorer reply entry {position} is not an object (got {kind})")]
    MalformedEntries {
        position: usize,
        kind: &'static str,
    },
}

/// Contract violation in one element of the scorer's reply.  Only that
/// element falls back; the rest of the batch is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has the wrong type")]
    InvalidType { field: &'static str },

    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("unknown sentiment `{0}`")]
    InvalidSentiment(String),
}
