use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::{debug, warn};

use signalboard_config::{LlmConfig, ScoringProvider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// A hosted model that turns one prompt into one text reply.
///
/// Implementations block until the reply arrives or the transport fails;
/// timeouts surface as ordinary errors.
pub trait CompletionClient {
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Short label for log lines.
    fn name(&self) -> &str;
}

/// Build the client for the configured provider.
///
/// Returns `None` when the provider has no credential, which puts the caller
/// in mock mode for the whole run.
pub fn build_client(config: &LlmConfig) -> Result<Option<Box<dyn CompletionClient>>> {
    if !config.has_credentials() {
        warn!(
            provider = ?config.provider,
            "scoring credential not found; scoring will be mocked"
        );
        return Ok(None);
    }

    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build scoring HTTP client")?;

    let client: Box<dyn CompletionClient> = match config.provider {
        ScoringProvider::Gemini => Box::new(GeminiClient {
            http,
            api_key: config.active_api_key().to_string(),
            model: config.gemini_model.clone(),
        }),
        ScoringProvider::OpenRouter => Box::new(OpenRouterClient {
            http,
            api_key: config.active_api_key().to_string(),
            model: config.openrouter_model.clone(),
        }),
    };
    Ok(Some(client))
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl CompletionClient for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let endpoint = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);
        let payload = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "gemini request");
        let response = self
            .http
            .post(endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        let body: serde_json::Value = response.json()?;
        if !status.is_success() {
            bail!("Gemini error ({status}): {body}");
        }

        body.get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .map(ToString::to_string)
            .with_context(|| format!("Gemini response missing text: {body}"))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

impl CompletionClient for OpenRouterClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "openrouter request");
        let response = self
            .http
            .post(OPENROUTER_CHAT_URL)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Signalboard")
            .json(&payload)
            .send()?;

        let status = response.status();
        let body: serde_json::Value = response.json()?;
        if !status.is_success() {
            bail!("OpenRouter error ({status}): {body}");
        }

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(ToString::to_string)
            .with_context(|| format!("OpenRouter response missing content: {body}"))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// ── Structured output extraction ──────────────────────────────────────────────

/// Extract the JSON payload from a model reply.
///
/// Models often wrap JSON in ` ```json ` fences or add a sentence around it.
/// Tries, in order:
/// 1. the first fenced ` ```json ` block;
/// 2. the span from the first opening bracket (`[` or `{`, whichever comes
///    first) to the last matching closing bracket.
///
/// Returns `None` when neither yields valid JSON for `T`.
///
/// ```rust
/// use signalboard_llm::extract_json_output;
///
/// let raw = "```json\n[{\"signal\":\"Rates hold\"}]\n```";
/// let rows: Vec<serde_json::Value> = extract_json_output(raw).unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
pub fn extract_json_output<T: serde::de::DeserializeOwned>(response: &str) -> Option<T> {
    // Strategy 1: fenced ```json ... ``` blocks.
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(fence_end) = after_fence.find("```") {
            let json_str = after_fence[..fence_end].trim();
            if let Ok(val) = serde_json::from_str(json_str) {
                return Some(val);
            }
        }
    }

    // Strategy 2: bare JSON, outermost bracket pair.
    let trimmed = response.trim();
    let start = trimmed.find(['[', '{'])?;
    let close = if trimmed[start..].starts_with('[') { ']' } else { '}' };
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

// ── Tests ────────────────────────────────────────────────────────────────────
