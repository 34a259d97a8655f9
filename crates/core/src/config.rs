//! Configuration structures for the quote analytics pipeline.
//!
//! Every lookup table the pipeline consults lives here and is passed in by
//! reference, so independent runs never share mutable state.

use crate::error::{Error, Result};
use crate::types::{Chain, TradeSize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-row acceptance rules.
    pub validation: ValidationConfig,
    /// Trade grouping tables.
    pub grouping: GroupingConfig,
    /// Per-trade outlier rejection.
    pub outliers: OutlierConfig,
}

impl PipelineConfig {
    /// Parse a JSON configuration document and check it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        if v.min_efficiency > v.max_efficiency {
            return Err(Error::config(format!(
                "min_efficiency {} exceeds max_efficiency {}",
                v.min_efficiency, v.max_efficiency
            )));
        }

        let sizes = &self.grouping.trade_sizes;
        if sizes.is_empty() {
            return Err(Error::config("trade_sizes must not be empty"));
        }
        if sizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::config("trade_sizes must be strictly ascending"));
        }

        let o = &self.outliers;
        if o.iqr_multiplier < 0.0 {
            return Err(Error::config("iqr_multiplier must be non-negative"));
        }
        if o.max_median_deviation < 0.0 {
            return Err(Error::config("max_median_deviation must be non-negative"));
        }
        if o.min_quotes == 0 {
            return Err(Error::config("min_quotes must be at least 1"));
        }
        Ok(())
    }
}

/// Quote acceptance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Aggregator names (compared trimmed and lowercased) that are never accepted.
    pub excluded_aggregators: BTreeSet<String>,
    /// Lowest accepted efficiency, in percent (inclusive).
    pub min_efficiency: f64,
    /// Highest accepted efficiency, in percent (inclusive).
    pub max_efficiency: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            excluded_aggregators: ["oogabooga", "test", "test_aggregator", "debug", "mock"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_efficiency: 95.0,
            max_efficiency: 101.0,
        }
    }
}

/// Trade grouping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Upstream chain name to canonical chain.
    pub chain_aliases: BTreeMap<String, Chain>,
    /// Chain used when a name is not in `chain_aliases`.
    pub default_chain: Chain,
    /// Stablecoin symbols used for pair classification.
    pub stablecoins: BTreeSet<String>,
    /// Notional buckets, ascending.
    pub trade_sizes: Vec<TradeSize>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        let chain_aliases = [
            ("Mainnet", Chain::Ethereum),
            ("Ethereum", Chain::Ethereum),
            ("Base", Chain::Base),
            ("Arbitrum", Chain::Arbitrum),
            ("Polygon", Chain::Polygon),
            ("Monad", Chain::Monad),
            ("HyperEVM", Chain::HyperEVM),
        ]
        .into_iter()
        .map(|(name, chain)| (name.to_string(), chain))
        .collect();

        Self {
            chain_aliases,
            default_chain: Chain::Ethereum,
            stablecoins: ["USDC", "USDT", "DAI", "USDD", "BUSD", "TUSD", "FRAX", "LUSD"]
                .into_iter()
                .map(String::from)
                .collect(),
            trade_sizes: TradeSize::ALL.to_vec(),
        }
    }
}

/// Outlier rejection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Trades with fewer quotes are not filtered.
    pub min_quotes: usize,
    /// Multiplier applied to the IQR for the rejection fences.
    pub iqr_multiplier: f64,
    /// Quotes slower than this are rejected (ms, exclusive).
    pub max_latency_ms: f64,
    /// Maximum relative distance from the trade's median price (0.10 = 10%).
    pub max_median_deviation: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            min_quotes: 4,
            iqr_multiplier: 2.5,
            max_latency_ms: 30_000.0,
            max_median_deviation: 0.10,
        }
    }
}
