use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ── Scoring provider ──────────────────────────────────────────────────────────

/// Hosted model used to score headlines.
///
/// | Provider     | Credential env var   |
/// |--------------|----------------------|
/// | `gemini`     | `GOOGLE_API_KEY`     |
/// | `openrouter` | `OPENROUTER_API_KEY` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringProvider {
    #[default]
    Gemini,
    OpenRouter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ScoringProvider,
    pub gemini_model: String,
    pub openrouter_model: String,
    /// Overridden by `GOOGLE_API_KEY` when that variable is set and non-empty.
    pub gemini_api_key: String,
    /// Overridden by `OPENROUTER_API_KEY` when that variable is set and non-empty.
    pub openrouter_api_key: String,
    /// Whole-request timeout for the batched scoring call.  A timeout is
    /// handled like any other transport failure.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ScoringProvider::Gemini,
            gemini_model: "gemini-2.5-flash-lite".to_string(),
            openrouter_model: "google/gemini-2.0-flash-001".to_string(),
            gemini_api_key: String::new(),
            openrouter_api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Key for the configured provider, trimmed.  Empty means "no credential".
    pub fn active_api_key(&self) -> &str {
        match self.provider {
            ScoringProvider::Gemini => self.gemini_api_key.trim(),
            ScoringProvider::OpenRouter => self.openrouter_api_key.trim(),
        }
    }

    pub fn active_model(&self) -> &str {
        match self.provider {
            ScoringProvider::Gemini => &self.gemini_model,
            ScoringProvider::OpenRouter => &self.openrouter_model,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.active_api_key().is_empty()
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Overridden by `SERPER_API_KEY` when that variable is set and non-empty.
    pub serper_api_key: String,
    pub endpoint: String,
    pub results_per_query: u32,
    /// Serper `tbs` filter; `qdr:d` restricts hits to the last 24 hours.
    pub time_window: String,
    /// Pause between consecutive search requests.
    pub pause_ms: u64,
    pub timeout_secs: u64,
    /// Query templates.  `{sector}` is replaced with the sector label.
    pub queries: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: String::new(),
            endpoint: "https://google.serper.dev/news".to_string(),
            results_per_query: 10,
            time_window: "qdr:d".to_string(),
            pause_ms: 500,
            timeout_secs: 15,
            queries: vec![
                "{sector} news site:linkedin.com".to_string(),
                "{sector} news site:twitter.com".to_string(),
                "{sector} news site:x.com".to_string(),
                "{sector} industry news".to_string(),
            ],
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum number of distinct vocabulary keywords an item's text must
    /// contain before it is sent to the scorer.
    pub keyword_threshold: usize,
    /// Seed for the mock scorer.  Unset means a fresh entropy seed per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keyword_threshold: 3,
            mock_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub sectors: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sectors: ["Fintech", "EdTech", "Healthcare", "AI"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "public/data/social_signals.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub scan: ScanConfig,
    /// Per-sector keyword lists.  Empty means the built-in vocabulary.
    pub keywords: BTreeMap<String, Vec<String>>,
    pub output: OutputConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Non-empty credential env vars take precedence over the config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|name| env::var(name).ok());
    }

    /// Credential overrides read through `lookup`; blank values are ignored.
    pub fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = non_empty("GOOGLE_API_KEY") {
            self.llm.gemini_api_key = key;
        }
        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.llm.openrouter_api_key = key;
        }
        if let Some(key) = non_empty("SERPER_API_KEY") {
            self.search.serper_api_key = key;
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
