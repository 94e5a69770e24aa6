//! News search client that feeds candidate headlines to the scorer.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use signalboard_config::SearchConfig;
use signalboard_scoring::CandidateItem;

/// One entry of Serper's `news` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewsHit {
    pub title: String,
    pub snippet: String,
    pub source: Option<String>,
    pub link: String,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsResponse {
    news: Vec<NewsHit>,
}

/// Replace `{sector}` in a query template.
pub fn expand_query(template: &str, sector: &str) -> String {
    template.replace("{sector}", sector)
}

/// Label shown on the dashboard card.  Social-site queries are labelled by
/// site; everything else keeps the publisher name.
pub fn display_source(query: &str, hit_source: Option<&str>) -> String {
    let query = query.to_lowercase();
    if query.contains("linkedin") {
        "LinkedIn".to_string()
    } else if query.contains("x.com") || query.contains("twitter") {
        "X (Twitter)".to_string()
    } else {
        hit_source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Web")
            .to_string()
    }
}

pub fn hit_to_candidate(hit: NewsHit, source: String) -> CandidateItem {
    CandidateItem {
        text: format!("{}. {}", hit.title, hit.snippet),
        original_headline: hit.title,
        snippet: Some(hit.snippet),
        source: Some(source),
        link: Some(hit.link),
        time: Some(hit.date.unwrap_or_else(|| "Today".to_string())),
    }
}

/// Placeholder used when a search round finds nothing, so the scorer always
/// has at least one item.
pub fn system_check_item() -> CandidateItem {
    CandidateItem {
        text: "System Check: No recent social signals found. API connectivity verified."
            .to_string(),
        original_headline: "System Check: No signals.".to_string(),
        snippet: Some("No data returned from search.".to_string()),
        source: Some("System".to_string()),
        link: Some("#".to_string()),
        time: None,
    }
}

#[derive(Debug, Clone)]
pub struct SerperClient {
    http: reqwest::blocking::Client,
    config: SearchConfig,
}

impl SerperClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        if config.serper_api_key.trim().is_empty() {
            bail!("SERPER_API_KEY not found; set it in .env or [search] serper_api_key");
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build search HTTP client")?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn search_news(&self, query: &str) -> Result<Vec<NewsHit>> {
        let payload = json!({
            "q": query,
            "num": self.config.results_per_query,
            "tbs": self.config.time_window,
        });

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("X-API-KEY", self.config.serper_api_key.trim())
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Serper error ({status}): {body}");
        }

        let body: NewsResponse = response.json()?;
        Ok(body.news)
    }

    /// Run every configured query for `sector`.  A failed query is logged
    /// and skipped.
    pub fn collect_sector(&self, sector: &str) -> Vec<CandidateItem> {
        let mut items = Vec::new();

        for (i, template) in self.config.queries.iter().enumerate() {
            if i > 0 && self.config.pause_ms > 0 {
                thread::sleep(Duration::from_millis(self.config.pause_ms));
            }

            let query = expand_query(template, sector);
            info!(%query, "searching");
            match self.search_news(&query) {
                Ok(hits) => {
                    items.extend(hits.into_iter().map(|hit| {
                        let source = display_source(&query, hit.source.as_deref());
                        hit_to_candidate(hit, source)
                    }));
                }
                Err(err) => warn!(%query, ?err, "search failed"),
            }
        }

        info!(sector, collected = items.len(), "search round complete");
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_query_substitutes_sector() {
        assert_eq!(
            expand_query("{sector} news site:x.com", "Fintech"),
            "Fintech news site:x.com"
        );
        assert_eq!(expand_query("no placeholder", "AI"), "no placeholder");
    }

    #[test]
    fn display_source_by_query_site() {
        assert_eq!(
            display_source("AI news site:linkedin.com", Some("Forbes")),
            "LinkedIn"
        );
        assert_eq!(display_source("AI news site:x.com", None), "X (Twitter)");
        assert_eq!(display_source("AI news site:twitter.com", None), "X (Twitter)");
        assert_eq!(display_source("AI industry news", Some("Forbes")), "Forbes");
        assert_eq!(display_source("AI industry news", Some("  ")), "Web");
        assert_eq!(display_source("AI industry news", None), "Web");
    }

    #[test]
    fn hit_to_candidate_joins_title_and_snippet() {
        let hit = NewsHit {
            title: "Visa buys fintech".to_string(),
            snippet: "Deal closes Q3".to_string(),
            source: Some("Reuters".to_string()),
            link: "https://example.com/visa".to_string(),
            date: None,
        };
        let item = hit_to_candidate(hit, "Reuters".to_string());
        assert_eq!(item.text, "Visa buys fintech. Deal closes Q3");
        assert_eq!(item.original_headline, "Visa buys fintech");
        assert_eq!(item.link.as_deref(), Some("https://example.com/visa"));
        assert_eq!(item.time.as_deref(), Some("Today"));
    }

    #[test]
    fn news_response_tolerates_missing_fields() {
        let raw = r#"{"news": [{"title": "Only a title"}], "searchParameters": {}}"#;
        let parsed: NewsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.news.len(), 1);
        assert_eq!(parsed.news[0].title, "Only a title");
        assert!(parsed.news[0].snippet.is_empty());
    }

    #[test]
    fn response_without_news_is_empty() {
        let parsed: NewsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.news.is_empty());
    }

    #[test]
    fn client_requires_api_key() {
        assert!(SerperClient::new(&SearchConfig::default()).is_err());
    }

    #[test]
    fn system_check_item_is_well_formed() {
        let item = system_check_item();
        assert!(!item.text.is_empty());
        assert_eq!(item.source.as_deref(), Some("System"));
    }
}
