//! Trade grouping.
//!
//! Buckets validated rows into trades keyed by
//! (timestamp, chain, input token, output token, USD notional). Trades keep the
//! order in which their key was first seen; ids are assigned in that order.

use dexq_core::{
    trade_id, Chain, GroupingConfig, Pair, PairType, Quote, RawRecord, Trade, TradeSize,
};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Map an upstream chain to its canonical chain.
///
/// The human-readable `chain_name` is preferred over the `chain` code when present.
/// Unknown names fall back to the configured default chain.
pub fn normalize_chain(chain: &str, chain_name: &str, config: &GroupingConfig) -> Chain {
    let key = if chain_name.is_empty() { chain } else { chain_name };
    config
        .chain_aliases
        .get(key)
        .copied()
        .unwrap_or(config.default_chain)
}

/// Classify a pair: both legs stable is Stable-Stable, anything else Native-Stable.
pub fn pair_type(token_in: &str, token_out: &str, stablecoins: &BTreeSet<String>) -> PairType {
    if stablecoins.contains(token_in) && stablecoins.contains(token_out) {
        PairType::StableStable
    } else {
        PairType::NativeStable
    }
}

/// Snap a USD notional to the closest bucket.
///
/// Buckets are scanned in order and only a strictly smaller distance replaces the
/// current choice, so ties go to the earlier (smaller) bucket.
pub fn round_to_trade_size(usd_amount: f64, sizes: &[TradeSize]) -> TradeSize {
    let Some(&first) = sizes.first() else {
        return TradeSize::K10;
    };

    let mut closest = first;
    let mut min_diff = (usd_amount - first.usd() as f64).abs();
    for &size in sizes {
        let diff = (usd_amount - size.usd() as f64).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = size;
        }
    }
    closest
}

/// Price of a raw quote, output per input.
///
/// Uses the USD ratio when both USD legs are positive, otherwise
/// expected amount over token amount. A zero denominator gives `0.0`.
pub fn quote_price(record: &RawRecord) -> f64 {
    if record.to_amount_usd > 0.0 && record.from_amount_usd > 0.0 {
        record.to_amount_usd / record.from_amount_usd
    } else if record.token_amount == 0.0 {
        0.0
    } else {
        record.expected_amount / record.token_amount
    }
}

/// Composite grouping key. Every component must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    timestamp: String,
    chain: Chain,
    from_token: String,
    to_token: String,
    /// Bit pattern of the USD notional.
    usd_amount: u64,
}

/// Bit pattern used as the notional key. `-0.0` and `0.0` share one key.
fn notional_bits(usd_amount: f64) -> u64 {
    if usd_amount == 0.0 {
        0.0f64.to_bits()
    } else {
        usd_amount.to_bits()
    }
}

/// A trade whose quotes are still being collected.
#[derive(Debug, Clone)]
struct TradeInProgress {
    timestamp: String,
    chain: Chain,
    pair: Pair,
    trade_size: TradeSize,
    quotes: Vec<Quote>,
}

/// Incremental grouper for validated rows.
pub struct TradeGrouper<'a> {
    config: &'a GroupingConfig,
    /// Key to position in `trades`.
    index: HashMap<GroupKey, usize>,
    /// Trades in first-seen order.
    trades: Vec<TradeInProgress>,
    rows: usize,
}

impl<'a> TradeGrouper<'a> {
    /// Create an empty grouper.
    pub fn new(config: &'a GroupingConfig) -> Self {
        Self {
            config,
            index: HashMap::new(),
            trades: Vec::new(),
            rows: 0,
        }
    }

    /// Add a validated row with its parsed efficiency.
    pub fn add(&mut self, record: &RawRecord, efficiency: f64) {
        let chain = normalize_chain(&record.chain, &record.chain_name, self.config);
        let key = GroupKey {
            timestamp: record.timestamp.clone(),
            chain,
            from_token: record.from_token.clone(),
            to_token: record.to_token.clone(),
            usd_amount: notional_bits(record.usd_amount),
        };

        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.trades.len();
                self.trades.push(TradeInProgress {
                    timestamp: record.timestamp.clone(),
                    chain,
                    pair: Pair {
                        token_in: record.from_token.clone(),
                        token_out: record.to_token.clone(),
                        pair_type: pair_type(
                            &record.from_token,
                            &record.to_token,
                            &self.config.stablecoins,
                        ),
                    },
                    trade_size: round_to_trade_size(record.usd_amount, &self.config.trade_sizes),
                    quotes: Vec::new(),
                });
                self.index.insert(key, idx);
                idx
            }
        };

        self.trades[idx].quotes.push(Quote {
            aggregator: record.project.clone(),
            price: quote_price(record),
            efficiency,
            latency_ms: record.latency_ms,
            expected_amount: record.expected_amount,
        });
        self.rows += 1;
    }

    /// Number of trades started so far.
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Finalize into trades with sequential ids (`trade-001`, ...) in first-seen order.
    pub fn finish(self) -> Vec<Trade> {
        debug!(rows = self.rows, trades = self.trades.len(), "grouped quotes into trades");

        self.trades
            .into_iter()
            .enumerate()
            .map(|(i, t)| Trade {
                id: trade_id(i + 1),
                chain: t.chain,
                token_in: t.pair.token_in.clone(),
                pair: t.pair,
                trade_size: t.trade_size,
                quotes: t.quotes,
                timestamp: t.timestamp,
            })
            .collect()
    }
}
