use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use signalboard_config::AppConfig;
use signalboard_scoring::{CandidateItem, KeywordVocabulary, RelevanceScorer, ScoredItem};
use signalboard_search::{SerperClient, system_check_item};

use crate::export::save_signals;

pub(crate) const MULTI_SECTOR: &str = "Multi-Sector";

pub(crate) fn run_scan(config: &AppConfig, sector: Option<String>, output: &Path) -> Result<()> {
    let sectors = match sector {
        Some(sector) => vec![sector],
        None => config.scan.sectors.clone(),
    };
    if sectors.is_empty() {
        bail!("no sectors to scan; pass --sector or set [scan] sectors");
    }

    let search = SerperClient::new(&config.search)?;
    let mut scorer = RelevanceScorer::from_config(config)?;
    println!("Starting social intelligence scan for: {}", sectors.join(", "));
    if !scorer.is_live() {
        println!("- scoring credential missing: results will use mock scores");
    }

    let mut results: Vec<ScoredItem> = Vec::new();
    for sector in &sectors {
        let items = search.collect_sector(sector);
        if items.is_empty() {
            warn!(sector = %sector, "no search results");
            continue;
        }
        results.extend(scorer.score_headlines(sector, &items));
    }

    if results.is_empty() {
        println!("No results found via search.");
        let label = if sectors.len() == 1 { sectors[0].as_str() } else { MULTI_SECTOR };
        results = scorer.score_headlines(label, &[system_check_item()]);
    }

    write_report(&results, output)
}

pub(crate) fn run_score(
    config: &AppConfig,
    input: &Path,
    sector: &str,
    output: &Path,
) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let items: Vec<CandidateItem> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of candidates", input.display()))?;
    if items.is_empty() {
        bail!("no candidates in {}", input.display());
    }

    let mut scorer = RelevanceScorer::from_config(config)?;
    info!(candidates = items.len(), sector, live = scorer.is_live(), "scoring file");
    let results = scorer.score_headlines(sector, &items);
    write_report(&results, output)
}

pub(crate) fn run_vocab(config: &AppConfig) {
    let vocabulary = KeywordVocabulary::from_config(&config.keywords);
    for keyword in vocabulary.iter() {
        println!("{keyword}");
    }
    println!("({} keywords, threshold {})", vocabulary.len(), config.pipeline.keyword_threshold);
}

fn write_report(results: &[ScoredItem], output: &Path) -> Result<()> {
    let relevant = results.iter().filter(|r| r.relevant).count();
    let count = save_signals(results, output)?;
    println!("Saved {count} signals to {}", output.display());
    println!("- relevant: {relevant}");
    Ok(())
}
