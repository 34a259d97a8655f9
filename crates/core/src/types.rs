//! Core data types for the quote analytics pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Parse a numeric field leniently.
///
/// Surrounding whitespace is ignored. Empty, unparsable and non-finite inputs
/// (`NaN`, `inf`, `infinity`) become `0.0`.
pub fn lenient_f64(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Canonical chain a trade was executed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    Monad,
    HyperEVM,
    Base,
    Arbitrum,
    #[serde(alias = "Mainnet")]
    Ethereum,
    Polygon,
}

impl Chain {
    /// All chains, in display order.
    pub const ALL: [Chain; 6] = [
        Chain::Monad,
        Chain::HyperEVM,
        Chain::Base,
        Chain::Arbitrum,
        Chain::Ethereum,
        Chain::Polygon,
    ];

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Monad => "Monad",
            Chain::HyperEVM => "HyperEVM",
            Chain::Base => "Base",
            Chain::Arbitrum => "Arbitrum",
            Chain::Ethereum => "Ethereum",
            Chain::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown chain: {s}"))
    }
}

/// Classification of a token pair by stablecoin membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairType {
    /// At most one leg is a stablecoin.
    #[serde(rename = "Native-Stable")]
    NativeStable,
    /// Both legs are stablecoins.
    #[serde(rename = "Stable-Stable")]
    StableStable,
}

/// A traded token pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    /// Input token symbol.
    pub token_in: String,
    /// Output token symbol.
    pub token_out: String,
    /// Derived pair classification.
    pub pair_type: PairType,
}

/// USD notional bucket of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
#[repr(u64)]
pub enum TradeSize {
    K10 = 10_000,
    K50 = 50_000,
    K100 = 100_000,
    K250 = 250_000,
    K500 = 500_000,
    M1 = 1_000_000,
}

impl TradeSize {
    /// All buckets, ascending.
    pub const ALL: [TradeSize; 6] = [
        TradeSize::K10,
        TradeSize::K50,
        TradeSize::K100,
        TradeSize::K250,
        TradeSize::K500,
        TradeSize::M1,
    ];

    /// Notional in USD.
    #[inline]
    pub fn usd(self) -> u64 {
        self as u64
    }
}

impl From<TradeSize> for u64 {
    fn from(size: TradeSize) -> Self {
        size.usd()
    }
}

impl TryFrom<u64> for TradeSize {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        TradeSize::ALL
            .iter()
            .copied()
            .find(|s| s.usd() == value)
            .ok_or_else(|| format!("invalid trade size: {value}"))
    }
}

/// One aggregator's quote for one attempted swap, as ingested.
///
/// Field names follow the upstream export columns. Every field is optional in
/// structured input; numeric fields accept numbers, numeric strings or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub chain: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub chain_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to_token: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub usd_amount: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub token_amount: f64,
    /// Aggregator name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub project: String,
    #[serde(rename = "expectedAmount", default, deserialize_with = "lenient_number")]
    pub expected_amount: f64,
    /// Efficiency as text with a trailing `%` (e.g. "99.94%").
    #[serde(default = "default_efficiency", deserialize_with = "lenient_efficiency")]
    pub efficiency: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latency_ms: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub from_amount_usd: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub to_amount_usd: f64,
}

impl Default for RawRecord {
    fn default() -> Self {
        Self {
            timestamp: String::new(),
            chain: String::new(),
            chain_name: String::new(),
            from_token: String::new(),
            to_token: String::new(),
            usd_amount: 0.0,
            token_amount: 0.0,
            project: String::new(),
            expected_amount: 0.0,
            efficiency: default_efficiency(),
            latency_ms: 0.0,
            from_amount_usd: 0.0,
            to_amount_usd: 0.0,
        }
    }
}

fn default_efficiency() -> String {
    "0%".to_string()
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => lenient_f64(&s),
        _ => 0.0,
    })
}

fn lenient_efficiency<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => default_efficiency(),
    })
}

/// One aggregator's cleaned offer within a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Aggregator name.
    pub aggregator: String,
    /// Output per input (USD ratio when available).
    pub price: f64,
    /// Upstream efficiency in percent.
    pub efficiency: f64,
    /// Quote latency in milliseconds.
    pub latency_ms: f64,
    /// Expected output amount.
    #[serde(rename = "expectedAmount", default)]
    pub expected_amount: f64,
}

/// All quotes competing for the same swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Sequential id, stable only within one pipeline run.
    pub id: String,
    pub chain: Chain,
    pub pair: Pair,
    pub trade_size: TradeSize,
    /// Primary input token.
    pub token_in: String,
    /// Quotes in arrival order.
    pub quotes: Vec<Quote>,
    pub timestamp: String,
}

impl Trade {
    /// Quote from the given aggregator, if any.
    pub fn quote_from(&self, aggregator: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.aggregator == aggregator)
    }
}

/// Format a sequential trade id (`trade-001`, `trade-002`, ...).
pub fn trade_id(seq: usize) -> String {
    format!("trade-{seq:03}")
}
