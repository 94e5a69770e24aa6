mod export;
mod scan_cmds;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use signalboard_config::AppConfig;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Parser)]
#[command(
    name = "signalboard",
    version,
    about = "Ranked market signals per industry sector"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search each sector, score the headlines and write the dashboard file.
    Scan {
        /// Scan only this sector instead of the configured list.
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score a JSON array of candidate items without searching.
    Score {
        #[arg(long, value_name = "PATH")]
        input: PathBuf,
        #[arg(long, default_value = scan_cmds::MULTI_SECTOR)]
        sector: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the keyword vocabulary used by the gate.
    Vocab,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let default_output = || PathBuf::from(&config.output.path);

    match cli.command.unwrap_or(Commands::Scan {
        sector: None,
        output: None,
    }) {
        Commands::Scan { sector, output } => {
            let output = output.unwrap_or_else(default_output);
            scan_cmds::run_scan(&config, sector, &output)?;
        }
        Commands::Score {
            input,
            sector,
            output,
        } => {
            let output = output.unwrap_or_else(default_output);
            scan_cmds::run_score(&config, &input, &sector, &output)?;
        }
        Commands::Vocab => scan_cmds::run_vocab(&config),
    }

    Ok(())
}
