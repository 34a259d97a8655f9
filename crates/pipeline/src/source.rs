//! Input source discovery and loading.
//!
//! A data directory may hold, in priority order:
//! 1. `quotes.csv`  - delimited export (tab or comma)
//! 2. `quotes.json` - array of raw records
//! 3. `trades.json` - already grouped trades, passed through untouched

use crate::pipeline::TradePipeline;
use dexq_core::{Error, RawRecord, Result, Trade};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Delimited export file name.
pub const DELIMITED_FILE: &str = "quotes.csv";
/// Raw record JSON file name.
pub const RAW_RECORDS_FILE: &str = "quotes.json";
/// Pre-grouped trade JSON file name.
pub const LEGACY_TRADES_FILE: &str = "trades.json";

/// A located input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    DelimitedText(PathBuf),
    RawRecords(PathBuf),
    LegacyTrades(PathBuf),
}

impl DataSource {
    /// Find the highest-priority source present in `dir`.
    pub fn discover(dir: &Path) -> Option<Self> {
        let candidates: [(&str, fn(PathBuf) -> Self); 3] = [
            (DELIMITED_FILE, DataSource::DelimitedText),
            (RAW_RECORDS_FILE, DataSource::RawRecords),
            (LEGACY_TRADES_FILE, DataSource::LegacyTrades),
        ];
        candidates.into_iter().find_map(|(name, make)| {
            let path = dir.join(name);
            path.is_file().then(|| make(path))
        })
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        match self {
            DataSource::DelimitedText(p) | DataSource::RawRecords(p) | DataSource::LegacyTrades(p) => p,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSource::DelimitedText(_) => "csv",
            DataSource::RawRecords(_) => "json",
            DataSource::LegacyTrades(_) => "legacy",
        }
    }

    /// Read the source and produce its dataset.
    pub fn load(&self, pipeline: &TradePipeline) -> Result<Dataset> {
        let content = fs::read_to_string(self.path())
            .map_err(|e| Error::input(format!("{}: {e}", self.path().display())))?;

        let dataset = match self {
            DataSource::DelimitedText(_) => {
                let records = dexq_ingestion::parse_delimited(&content);
                if records.is_empty() {
                    warn!(path = %self.path().display(), "delimited source parsed but no rows found");
                }
                Dataset::Trades(pipeline.run(&records))
            }
            DataSource::RawRecords(_) => Dataset::Trades(pipeline.run(&parse_raw_records(&content)?)),
            DataSource::LegacyTrades(_) => Dataset::Legacy(parse_legacy_trades(&content)?),
        };

        info!(trades = dataset.len(), source = self.kind(), "loaded trades");
        Ok(dataset)
    }
}

/// Trades produced by one source.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Built by the pipeline from raw rows.
    Trades(Vec<Trade>),
    /// Pre-grouped entries from `trades.json`, kept exactly as read.
    Legacy(Vec<Value>),
}

impl Dataset {
    /// Number of trades (or legacy entries).
    pub fn len(&self) -> usize {
        match self {
            Dataset::Trades(trades) => trades.len(),
            Dataset::Legacy(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON document of the trade list. Legacy entries come back unchanged.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            Dataset::Trades(trades) => Ok(serde_json::to_value(trades)?),
            Dataset::Legacy(entries) => Ok(Value::Array(entries.clone())),
        }
    }

    /// Typed trades. Legacy entries that do not fit the trade model are skipped.
    pub fn into_trades(self) -> Vec<Trade> {
        match self {
            Dataset::Trades(trades) => trades,
            Dataset::Legacy(entries) => {
                let total = entries.len();
                let trades: Vec<Trade> = entries
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                        Ok(trade) => Some(trade),
                        Err(e) => {
                            warn!(index = i, error = %e, "skipping legacy trade outside the trade model");
                            None
                        }
                    })
                    .collect();
                if trades.len() < total {
                    debug!(kept = trades.len(), total, "typed legacy trades");
                }
                trades
            }
        }
    }
}

/// Parse a JSON array of raw records.
pub fn parse_raw_records(json: &str) -> Result<Vec<RawRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a legacy trade file. Only the top-level array shape is checked.
pub fn parse_legacy_trades(json: &str) -> Result<Vec<Value>> {
    match serde_json::from_str(json)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(Error::data(format!("{LEGACY_TRADES_FILE} must hold a JSON array"))),
    }
}

/// Load the dataset from the best source in `dir`.
///
/// A directory without any source yields an empty trade list.
pub fn load_dataset(dir: &Path, pipeline: &TradePipeline) -> Result<Dataset> {
    let Some(source) = DataSource::discover(dir) else {
        warn!(dir = %dir.display(), "no data files found");
        return Ok(Dataset::Trades(Vec::new()));
    };

    source.load(pipeline).map_err(|e| {
        error!(path = %source.path().display(), error = %e, "failed to load data");
        e
    })
}

/// Load typed trades from the best source in `dir`.
pub fn load_trades(dir: &Path, pipeline: &TradePipeline) -> Result<Vec<Trade>> {
    load_dataset(dir, pipeline).map(Dataset::into_trades)
}
