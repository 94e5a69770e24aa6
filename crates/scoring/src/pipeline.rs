use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use signalboard_config::AppConfig;
use signalboard_llm::{CompletionClient, build_client};

use crate::gate::KeywordGate;
use crate::merge::assemble;
use crate::mock::MockScorer;
use crate::request::ScoreRequester;
use crate::types::{CandidateItem, ScoredItem};
use crate::vocabulary::KeywordVocabulary;

/// Gate → score → merge over one sector batch.
///
/// Built once per run.  Without a scoring client every item is mocked for
/// the whole run; with one, gate-passing items go to the hosted scorer in a
/// single call and fall back to the mock scorer if that call fails.
pub struct RelevanceScorer {
    gate: KeywordGate,
    client: Option<Box<dyn CompletionClient>>,
    mock: MockScorer,
}

impl std::fmt::Debug for RelevanceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceScorer")
            .field("gate", &self.gate)
            .field("client", &self.client.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl RelevanceScorer {
    pub fn new(
        gate: KeywordGate,
        client: Option<Box<dyn CompletionClient>>,
        mock: MockScorer,
    ) -> Self {
        Self { gate, client, mock }
    }

    /// Vocabulary, gate threshold, mock seed and client all come from
    /// `config`.  A missing credential is not an error.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let vocabulary = Arc::new(KeywordVocabulary::from_config(&config.keywords));
        info!(keywords = vocabulary.len(), "keyword vocabulary built");

        let gate = KeywordGate::new(vocabulary, config.pipeline.keyword_threshold);
        let client = build_client(&config.llm)?;
        let mock = MockScorer::from_seed_option(config.pipeline.mock_seed);
        Ok(Self::new(gate, client, mock))
    }

    /// `true` when a hosted scorer is configured.
    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    pub fn gate(&self) -> &KeywordGate {
        &self.gate
    }

    /// Score `items` for `sector`.
    ///
    /// Never fails: the result has one record per input item and
    /// `result[i]` always describes `items[i]`.
    pub fn score_headlines(&mut self, sector: &str, items: &[CandidateItem]) -> Vec<ScoredItem> {
        if items.is_empty() {
            return Vec::new();
        }

        let Some(client) = self.client.as_deref() else {
            return self.mock.score(items);
        };

        let partition = self.gate.partition(sector, items);
        if partition.passed.is_empty() {
            info!(
                sector,
                threshold = self.gate.threshold(),
                "no headlines met the keyword criteria; skipping scorer call"
            );
            return assemble(items, partition.filtered);
        }

        let passed: Vec<&CandidateItem> = partition.passed.iter().map(|&i| &items[i]).collect();
        info!(
            sector,
            scoring = passed.len(),
            total = items.len(),
            "scoring headlines via API"
        );

        let scored = match ScoreRequester::new(client).request(sector, &passed) {
            Ok(scored) => scored,
            Err(err) => {
                warn!(sector, %err, "error during scoring; falling back to mock scores");
                passed
                    .iter()
                    .map(|item| self.mock.score_one(item))
                    .collect()
            }
        };

        let live = partition.passed.into_iter().zip(scored);
        assemble(items, partition.filtered.into_iter().chain(live))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::bail;
    use serde_json::json;

    use super::*;
    use crate::gate::DEFAULT_KEYWORD_THRESHOLD;
    use crate::types::{ERROR_BRIEF, FILTERED_BRIEF, MOCK_BRIEF, ScoreOrigin};

    /// Replays a canned reply and records every prompt it receives.
    struct FakeClient {
        reply: Result<String, String>,
        prompts: Rc<RefCell<Vec<String>>>,
    }

    impl FakeClient {
        fn replying(reply: impl Into<String>) -> (Self, Rc<RefCell<Vec<String>>>) {
            let prompts = Rc::new(RefCell::new(Vec::new()));
            let client = Self {
                reply: Ok(reply.into()),
                prompts: Rc::clone(&prompts),
            };
            (client, prompts)
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl CompletionClient for FakeClient {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => bail!("{message}"),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn scorer(client: Option<Box<dyn CompletionClient>>) -> RelevanceScorer {
        let gate = KeywordGate::new(
            Arc::new(KeywordVocabulary::builtin()),
            DEFAULT_KEYWORD_THRESHOLD,
        );
        RelevanceScorer::new(gate, client, MockScorer::seeded(7))
    }

    fn item(text: &str, headline: &str) -> CandidateItem {
        CandidateItem {
            text: text.to_string(),
            original_headline: headline.to_string(),
            snippet: None,
            source: Some("Reuters".to_string()),
            link: Some(format!("https://example.com/{headline}")),
            time: Some("Today".to_string()),
        }
    }

    fn entry(signal: &str, u: u8, n: u8, i: u8) -> serde_json::Value {
        json!({
            "signal": signal,
            "sentiment": "positive",
            "utility_score": u,
            "novelty_score": n,
            "impact_score": i,
            "brief": "matters"
        })
    }

    // ── End to end ─────────────────────────────────────────────────────────

    #[test]
    fn gate_then_live_score_keeps_input_order() {
        let items = vec![
            item("Crypto wallet bank stock", "A"),
            item("Bank branch opens downtown", "B"),
        ];
        let reply = json!([entry("A summary", 10, 10, 10)]).to_string();
        let (client, prompts) = FakeClient::replying(reply);
        let mut scorer = scorer(Some(Box::new(client)));

        let out = scorer.score_headlines("Fintech", &items);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item.original_headline, "A");
        assert_eq!(out[0].origin, ScoreOrigin::Live);
        assert_eq!(out[0].signal, "A summary");
        assert_eq!(out[0].score, 10.0);
        assert!(out[0].relevant);

        assert_eq!(out[1].item.original_headline, "B");
        assert_eq!(out[1].score, 0.0);
        assert!(!out[1].relevant);
        assert_eq!(out[1].brief, FILTERED_BRIEF);

        // Only A was sent, in one request.
        let prompts = prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Crypto wallet bank stock"));
        assert!(!prompts[0].contains("Bank branch opens downtown"));
    }

    #[test]
    fn partial_reply_fills_last_position() {
        let items = vec![
            item("Bank payment stock", "A"),
            item("Crypto wallet bank stock", "B"),
            item("Patient doctor vaccine", "C"),
        ];
        let reply = json!([entry("a", 5, 5, 5), entry("b", 6, 6, 6)]).to_string();
        let (client, _) = FakeClient::replying(reply);
        let mut scorer = scorer(Some(Box::new(client)));

        let out = scorer.score_headlines("Multi-Sector", &items);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].origin, ScoreOrigin::Live);
        assert_eq!(out[1].origin, ScoreOrigin::Live);
        assert_eq!(out[2].origin, ScoreOrigin::Fallback);
        assert_eq!(out[2].brief, ERROR_BRIEF);
        assert_eq!(out[2].item.original_headline, "C");
    }

    #[test]
    fn malformed_reply_mocks_passing_items_only() {
        let items = vec![
            item("Bank branch opens downtown", "filtered"),
            item("Bank payment stock", "passing"),
        ];
        let (client, _) = FakeClient::replying("The market looks great today!");
        let mut scorer = scorer(Some(Box::new(client)));

        let out = scorer.score_headlines("Fintech", &items);

        assert_eq!(out[0].origin, ScoreOrigin::Filtered);
        assert_eq!(out[1].origin, ScoreOrigin::Mock);
        assert_eq!(out[1].brief, MOCK_BRIEF);
        assert!((4.0..=9.0).contains(&out[1].score));
        assert_eq!(out[1].utility_score, 5);
    }

    #[test]
    fn string_entries_mock_every_passing_item() {
        let items = vec![
            item("Bank payment stock", "A"),
            item("Bank branch opens downtown", "filtered"),
            item("Crypto wallet bank stock", "B"),
        ];
        let (client, _) = FakeClient::replying(r#"["a", "b"]"#);
        let mut scorer = scorer(Some(Box::new(client)));

        let out = scorer.score_headlines("Fintech", &items);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].origin, ScoreOrigin::Mock);
        assert_eq!(out[0].brief, MOCK_BRIEF);
        assert_eq!(out[1].origin, ScoreOrigin::Filtered);
        assert_eq!(out[2].origin, ScoreOrigin::Mock);
        assert_eq!(out[2].item.original_headline, "B");
    }

    #[test]
    fn transport_error_mocks_passing_items() {
        let items = vec![item("Bank payment stock", "A")];
        let mut scorer = scorer(Some(Box::new(FakeClient::failing("connection reset"))));

        let out = scorer.score_headlines("Fintech", &items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].origin, ScoreOrigin::Mock);
        assert_eq!(out[0].item.link.as_deref(), Some("https://example.com/A"));
    }

    #[test]
    fn no_passing_items_skips_the_call() {
        let items = vec![item("Bank payment", "A"), item("", "B")];
        let (client, prompts) = FakeClient::replying("[]");
        let mut scorer = scorer(Some(Box::new(client)));

        let out = scorer.score_headlines("Fintech", &items);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.origin == ScoreOrigin::Filtered));
        assert!(prompts.borrow().is_empty());
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let (client, prompts) = FakeClient::replying("[]");
        let mut scorer = scorer(Some(Box::new(client)));
        assert!(scorer.score_headlines("Fintech", &[]).is_empty());
        assert!(prompts.borrow().is_empty());
    }

    // ── Mock mode ──────────────────────────────────────────────────────────

    #[test]
    fn without_client_every_item_is_mocked() {
        let items = vec![item("Bank payment stock", "A"), item("nothing here", "B")];
        let mut scorer = scorer(None);
        assert!(!scorer.is_live());

        let out = scorer.score_headlines("Fintech", &items);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.origin == ScoreOrigin::Mock));
        assert_eq!(out[1].signal, "B");
    }

    #[test]
    fn mock_mode_is_deterministic_for_a_seed() {
        let items = vec![item("x", "A"), item("y", "B"), item("z", "C")];
        let a = scorer(None).score_headlines("AI", &items);
        let b = scorer(None).score_headlines("AI", &items);
        assert_eq!(a, b);
    }

    #[test]
    fn from_config_without_credentials_is_mock_mode() {
        let mut config = AppConfig::default();
        config.pipeline.mock_seed = Some(1);
        let scorer = RelevanceScorer::from_config(&config).unwrap();
        assert!(!scorer.is_live());
        assert_eq!(scorer.gate().threshold(), 3);
    }
}
