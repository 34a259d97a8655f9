//! Command-line front end.
//!
//! Usage:
//!   dexq transform --data-dir ./data
//!   dexq report --data-dir ./data --chain Base --versus odos --versus kyber
//!   dexq report --data-dir ./data --versus-chain Base --versus-chain Arbitrum
//!
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dexq_core::{Chain, PipelineConfig, Trade, TradeSize};
use dexq_features::{AggregatorComparison, ChainComparison, Report, TradeFilter};
use dexq_pipeline::{diagnostics, load_dataset, Dataset, ErrorReport, TradePipeline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Dex aggregator quote analytics
#[derive(Parser, Debug)]
#[command(name = "dexq")]
#[command(about = "Clean, group and compare dex aggregator quotes")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory holding quotes.csv, quotes.json or trades.json
    #[arg(short, long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// JSON pipeline configuration (defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Include diagnostic details in failure reports
    #[arg(long, global = true)]
    dev: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the cleaned trade list
    Transform,

    /// Print comparative statistics
    Report {
        /// Only trades on this chain
        #[arg(long)]
        chain: Option<Chain>,

        /// Only trades quoted by one of these aggregators
        #[arg(long)]
        aggregator: Vec<String>,

        /// Smallest trade size in USD
        #[arg(long, value_parser = parse_size)]
        min_size: Option<TradeSize>,

        /// Largest trade size in USD
        #[arg(long, value_parser = parse_size)]
        max_size: Option<TradeSize>,

        /// Two aggregators to compare head to head
        #[arg(long, num_args = 1)]
        versus: Vec<String>,

        /// Two chains to compare
        #[arg(long, num_args = 1)]
        versus_chain: Vec<Chain>,
    },
}

fn parse_size(raw: &str) -> Result<TradeSize, String> {
    let usd: u64 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    TradeSize::try_from(usd)
}

fn load_config(path: Option<&Path>) -> dexq_core::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn load(common: &CommonArgs) -> dexq_core::Result<Dataset> {
    let pipeline = TradePipeline::new(load_config(common.config.as_deref())?)?;
    load_dataset(&common.data_dir, &pipeline)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let dataset = match load(&cli.common) {
        Ok(dataset) => dataset,
        Err(err) => {
            let development = cli.common.dev || diagnostics::is_development();
            let report = ErrorReport::new(&err, development);
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(ExitCode::FAILURE);
        }
    };

    let output = match cli.command {
        Commands::Transform => dataset.to_json()?,
        Commands::Report {
            chain,
            aggregator,
            min_size,
            max_size,
            versus,
            versus_chain,
        } => {
            let trades = dataset.into_trades();
            let defaults = TradeFilter::default();
            let filter = TradeFilter {
                chain,
                pairs: Vec::new(),
                min_size: min_size.unwrap_or(defaults.min_size),
                max_size: max_size.unwrap_or(defaults.max_size),
                aggregators: aggregator,
            };
            let selected: Vec<Trade> = filter.apply(&trades).into_iter().cloned().collect();

            let mut value = serde_json::to_value(Report::build(&selected))?;
            if let [first, second] = versus.as_slice() {
                value["aggregatorComparison"] =
                    serde_json::to_value(AggregatorComparison::build(&selected, first, second))?;
            } else if !versus.is_empty() {
                anyhow::bail!("--versus takes exactly two aggregators");
            }
            if let [first, second] = versus_chain.as_slice() {
                value["chainComparison"] =
                    serde_json::to_value(ChainComparison::build(&selected, *first, *second))?;
            } else if !versus_chain.is_empty() {
                anyhow::bail!("--versus-chain takes exactly two chains");
            }
            value["filter"] = serde_json::to_value(&filter)?;
            value
        }
    };

    println!("{}", serde_json::to_string_pretty(&output).context("serializing output")?);
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}
