//! Trade selection by chain, pair, size range and aggregator.

use dexq_core::{Chain, Trade, TradeSize};
use serde::{Deserialize, Serialize};

/// Criteria a trade must satisfy to enter a report.
///
/// Empty lists and `None` match everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeFilter {
    pub chain: Option<Chain>,
    /// (input token, output token) pairs.
    pub pairs: Vec<(String, String)>,
    /// Inclusive size range.
    pub min_size: TradeSize,
    pub max_size: TradeSize,
    /// Keep trades quoted by at least one of these aggregators.
    pub aggregators: Vec<String>,
}

impl Default for TradeFilter {
    fn default() -> Self {
        Self {
            chain: None,
            pairs: Vec::new(),
            min_size: TradeSize::K10,
            max_size: TradeSize::M1,
            aggregators: Vec::new(),
        }
    }
}

impl TradeFilter {
    /// Check a single trade.
    pub fn matches(&self, trade: &Trade) -> bool {
        if self.chain.is_some_and(|c| c != trade.chain) {
            return false;
        }
        if !self.pairs.is_empty()
            && !self
                .pairs
                .iter()
                .any(|(i, o)| *i == trade.pair.token_in && *o == trade.pair.token_out)
        {
            return false;
        }
        if trade.trade_size < self.min_size || trade.trade_size > self.max_size {
            return false;
        }
        if !self.aggregators.is_empty()
            && !trade
                .quotes
                .iter()
                .any(|q| self.aggregators.contains(&q.aggregator))
        {
            return false;
        }
        true
    }

    /// Trades that match, in input order.
    pub fn apply<'t>(&self, trades: &'t [Trade]) -> Vec<&'t Trade> {
        trades.iter().filter(|t| self.matches(t)).collect()
    }
}
