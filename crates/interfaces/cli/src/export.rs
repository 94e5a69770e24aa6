//! Dashboard JSON written for the front end.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use signalboard_scoring::{ScoredItem, Sentiment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SignalMetrics {
    pub utility: u8,
    pub novelty: u8,
    pub impact: u8,
}

/// One dashboard card.  `ticker` is rendered as the source label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DashboardSignal {
    pub id: Uuid,
    pub name: String,
    pub ticker: String,
    pub signal: String,
    pub sentiment: Sentiment,
    pub relevant: bool,
    pub score: f64,
    pub time: String,
    pub brief: String,
    pub link: String,
    pub metrics: SignalMetrics,
}

impl DashboardSignal {
    pub(crate) fn from_scored(scored: &ScoredItem) -> Self {
        let source = scored.item.source.as_deref();
        let brief = if scored.brief.trim().is_empty() {
            "No brief available.".to_string()
        } else {
            scored.brief.clone()
        };

        Self {
            id: Uuid::new_v4(),
            name: source.unwrap_or("Social Signal").to_string(),
            ticker: source.unwrap_or("WEB").to_string(),
            signal: scored.signal.clone(),
            sentiment: scored.sentiment,
            relevant: scored.relevant,
            score: scored.score,
            time: scored
                .item
                .time
                .clone()
                .unwrap_or_else(|| Local::now().format("%H:%M").to_string()),
            brief,
            link: scored.item.link.clone().unwrap_or_else(|| "#".to_string()),
            metrics: SignalMetrics {
                utility: scored.utility_score,
                novelty: scored.novelty_score,
                impact: scored.impact_score,
            },
        }
    }
}

/// Dashboard cards sorted by score, highest first.  Ties keep input order.
pub(crate) fn to_dashboard(scored: &[ScoredItem]) -> Vec<DashboardSignal> {
    let mut signals: Vec<DashboardSignal> =
        scored.iter().map(DashboardSignal::from_scored).collect();
    signals.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    signals
}

pub(crate) fn save_signals(scored: &[ScoredItem], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let signals = to_dashboard(scored);
    let rendered = serde_json::to_string_pretty(&signals)?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(signals.len())
}
