//! Headline relevance scoring.
//!
//! Candidate headlines pass through a keyword gate, gate survivors are scored
//! by a hosted model in one batched call, and the reply is merged back by
//! position.  Every failure degrades to a same-shaped record, so callers
//! always get one [`ScoredItem`] per [`CandidateItem`] in input order.

pub mod error;
pub mod gate;
pub mod merge;
pub mod mock;
pub mod pipeline;
pub mod request;
pub mod types;
pub mod vocabulary;

pub use error::{RecordError, ScoringError};
pub use gate::{DEFAULT_KEYWORD_THRESHOLD, GatePartition, KeywordGate};
pub use merge::{assemble, merge_record, merge_reply};
pub use mock::MockScorer;
pub use pipeline::RelevanceScorer;
pub use request::{ScoreRequester, ScorerRecord, build_prompt, parse_reply};
pub use types::{
    CandidateItem, ERROR_BRIEF, FILTERED_BRIEF, MAX_SIGNAL_CHARS, MOCK_BRIEF,
    RELEVANCE_THRESHOLD, ScoreOrigin, ScoredItem, Sentiment, is_relevant, round1,
    weighted_score,
};
pub use vocabulary::{KeywordVocabulary, builtin_sector_keywords};
