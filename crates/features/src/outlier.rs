//! Per-trade outlier rejection.
//!
//! A quote is dropped when any of these hold:
//! - its price lies outside the IQR fences of the trade's prices
//! - its efficiency lies outside the IQR fences of the trade's efficiencies
//! - its latency exceeds the latency ceiling
//! - its price is further than the allowed fraction from the median price
//!
//! Fences are `[Q1 - k*IQR, Q3 + k*IQR]` with Q1/Q3 read at indices
//! `floor(0.25 n)` and `floor(0.75 n)` of the sorted series (no interpolation).
//! Flagged values are matched by value, so every quote sharing a flagged value
//! is dropped with it.

use crate::metrics::{median_of_sorted, sorted};
use dexq_core::{OutlierConfig, Quote, Trade};
use ordered_float::OrderedFloat;
use std::collections::HashSet;
use tracing::debug;

/// Value read at `floor(p * n)` of a sorted slice.
#[inline]
fn index_quantile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Values outside the IQR fences.
///
/// Returns an empty set when fewer than `min_len` values are given.
pub fn iqr_outliers(values: &[f64], multiplier: f64, min_len: usize) -> HashSet<OrderedFloat<f64>> {
    if values.is_empty() || values.len() < min_len {
        return HashSet::new();
    }

    let series = sorted(values.iter().copied());
    let q1 = index_quantile(&series, 0.25);
    let q3 = index_quantile(&series, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    values
        .iter()
        .filter(|&&v| v < lower || v > upper)
        .map(|&v| OrderedFloat(v))
        .collect()
}

/// Result of filtering one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Too few quotes to estimate quartiles; nothing checked.
    Skipped,
    /// Some quotes survived; `removed` were dropped.
    Filtered { removed: usize },
    /// Every quote was rejected; the unfiltered list was kept.
    Reverted,
}

/// Outlier filter driven by an [`OutlierConfig`].
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    config: OutlierConfig,
}

impl OutlierFilter {
    /// Create a new outlier filter.
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Indices of quotes that pass every rule.
    fn surviving(&self, quotes: &[Quote]) -> Vec<usize> {
        let cfg = &self.config;

        let prices: Vec<f64> = quotes.iter().map(|q| q.price).collect();
        let efficiencies: Vec<f64> = quotes.iter().map(|q| q.efficiency).collect();
        let price_outliers = iqr_outliers(&prices, cfg.iqr_multiplier, cfg.min_quotes);
        let efficiency_outliers = iqr_outliers(&efficiencies, cfg.iqr_multiplier, cfg.min_quotes);
        let median = median_of_sorted(&sorted(prices.iter().copied()));

        quotes
            .iter()
            .enumerate()
            .filter(|(_, q)| {
                let deviation = if median > 0.0 {
                    ((q.price - median) / median).abs()
                } else {
                    0.0
                };

                !price_outliers.contains(&OrderedFloat(q.price))
                    && !efficiency_outliers.contains(&OrderedFloat(q.efficiency))
                    && q.latency_ms <= cfg.max_latency_ms
                    && deviation <= cfg.max_median_deviation
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Filter a quote list, returning the survivors and what happened.
    ///
    /// Lists shorter than `min_quotes` are returned unchanged. When no quote
    /// survives, the unfiltered list is returned so a trade never loses all quotes.
    pub fn filter(&self, quotes: &[Quote]) -> (Vec<Quote>, FilterOutcome) {
        if quotes.len() < self.config.min_quotes {
            return (quotes.to_vec(), FilterOutcome::Skipped);
        }

        let keep = self.surviving(quotes);
        if keep.is_empty() {
            debug!(quotes = quotes.len(), "every quote rejected, keeping unfiltered list");
            return (quotes.to_vec(), FilterOutcome::Reverted);
        }

        let removed = quotes.len() - keep.len();
        if removed > 0 {
            debug!(quotes = quotes.len(), removed, "removed outlier quotes");
        }
        let filtered = keep.into_iter().map(|i| quotes[i].clone()).collect();
        (filtered, FilterOutcome::Filtered { removed })
    }

    /// Filter a trade's quotes in place.
    pub fn apply(&self, trade: &mut Trade) -> FilterOutcome {
        let (quotes, outcome) = self.filter(&trade.quotes);
        trade.quotes = quotes;
        outcome
    }
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(OutlierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(aggregator: &str, price: f64, efficiency: f64, latency_ms: f64) -> Quote {
        Quote {
            aggregator: aggregator.to_string(),
            price,
            efficiency,
            latency_ms,
            expected_amount: 0.0,
        }
    }

    fn aggregators(quotes: &[Quote]) -> Vec<&str> {
        quotes.iter().map(|q| q.aggregator.as_str()).collect()
    }

    #[test]
    fn test_iqr_index_quantiles() {
        // Sorted [100, 101, 102, 500]: Q1 = s[1] = 101, Q3 = s[3] = 500.
        // Fences are wide enough that 500 is not an IQR outlier.
        let out = iqr_outliers(&[100.0, 101.0, 102.0, 500.0], 2.5, 4);
        assert!(out.is_empty());

        // Sorted [1, 1, 1, 1, 1, 1, 1, 9]: Q1 = Q3 = 1, IQR = 0.
        let out = iqr_outliers(&[1.0, 1.0, 9.0, 1.0, 1.0, 1.0, 1.0, 1.0], 2.5, 4);
        assert_eq!(out.len(), 1);
        assert!(out.contains(&OrderedFloat(9.0)));
    }

    #[test]
    fn test_iqr_needs_min_len() {
        assert!(iqr_outliers(&[1.0, 1.0, 50.0], 2.5, 4).is_empty());
        assert!(iqr_outliers(&[], 2.5, 0).is_empty());
    }

    #[test]
    fn test_skips_small_trades() {
        let filter = OutlierFilter::default();
        let quotes = vec![
            quote("a", 1.0, 99.0, 100.0),
            quote("b", 5.0, 99.0, 100.0),
            quote("c", 1.0, 99.0, 60_000.0),
        ];
        let (kept, outcome) = filter.filter(&quotes);
        assert_eq!(outcome, FilterOutcome::Skipped);
        assert_eq!(kept, quotes);
    }

    #[test]
    fn test_far_price_removed_by_median_deviation() {
        let filter = OutlierFilter::default();
        let quotes = vec![
            quote("a", 100.0, 99.0, 100.0),
            quote("b", 101.0, 99.1, 100.0),
            quote("c", 102.0, 99.2, 100.0),
            quote("d", 500.0, 99.05, 100.0),
        ];
        let (kept, outcome) = filter.filter(&quotes);
        assert_eq!(outcome, FilterOutcome::Filtered { removed: 1 });
        assert_eq!(aggregators(&kept), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_latency_ceiling() {
        let filter = OutlierFilter::default();
        let quotes = vec![
            quote("a", 1.000, 99.0, 100.0),
            quote("b", 1.001, 99.0, 30_000.0),
            quote("c", 1.002, 99.0, 30_001.0),
            quote("d", 1.003, 99.0, 200.0),
        ];
        let (kept, _) = filter.filter(&quotes);
        assert_eq!(aggregators(&kept), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_efficiency_outlier() {
        let filter = OutlierFilter::default();
        let quotes = vec![
            quote("a", 1.000, 99.90, 100.0),
            quote("b", 1.000, 99.91, 100.0),
            quote("c", 1.000, 99.92, 100.0),
            quote("d", 1.000, 99.91, 100.0),
            quote("e", 1.000, 95.00, 100.0),
        ];
        // Sorted efficiencies [95, 99.9, 99.91, 99.91, 99.92]: Q1 = 99.9, Q3 = 99.91.
        let (kept, outcome) = filter.filter(&quotes);
        assert_eq!(outcome, FilterOutcome::Filtered { removed: 1 });
        assert_eq!(aggregators(&kept), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_reverts_when_everything_rejected() {
        let filter = OutlierFilter::default();
        let quotes: Vec<Quote> = ["a", "b", "c", "d"]
            .iter()
            .map(|a| quote(a, 1.0, 99.0, 45_000.0))
            .collect();
        let (kept, outcome) = filter.filter(&quotes);
        assert_eq!(outcome, FilterOutcome::Reverted);
        assert_eq!(kept, quotes);
    }

    #[test]
    fn test_duplicate_outlier_values_all_removed() {
        // Value matching: both quotes at 9.0 are dropped, not just one of them.
        let filter = OutlierFilter::new(OutlierConfig {
            max_median_deviation: f64::INFINITY,
            ..OutlierConfig::default()
        });
        let mut quotes: Vec<Quote> = (0..7).map(|i| quote(&format!("agg{i}"), 1.0, 99.0, 100.0)).collect();
        quotes.push(quote("x", 9.0, 99.0, 100.0));
        quotes.push(quote("y", 9.0, 99.0, 100.0));

        let (kept, outcome) = filter.filter(&quotes);
        assert_eq!(outcome, FilterOutcome::Filtered { removed: 2 });
        assert!(kept.iter().all(|q| q.price == 1.0));
    }

    #[test]
    fn test_output_count_bounds() {
        let filter = OutlierFilter::default();
        let cases: Vec<Vec<Quote>> = vec![
            vec![quote("a", 1.0, 99.0, 10.0)],
            (0..6).map(|i| quote("a", 1.0 + i as f64 * 0.001, 99.0, 10.0)).collect(),
            (0..6).map(|i| quote("a", 1.0 + i as f64, 99.0, 10.0)).collect(),
            (0..5).map(|_| quote("a", 0.0, 99.0, 99_999.0)).collect(),
        ];
        for quotes in cases {
            let (kept, outcome) = filter.filter(&quotes);
            assert!(!kept.is_empty());
            assert!(kept.len() <= quotes.len());
            if outcome == FilterOutcome::Reverted {
                assert_eq!(kept.len(), quotes.len());
            }
        }
    }

    #[test]
    fn test_apply_in_place() {
        let filter = OutlierFilter::default();
        let mut trade = Trade {
            id: "trade-001".into(),
            chain: dexq_core::Chain::Base,
            pair: dexq_core::Pair {
                token_in: "ETH".into(),
                token_out: "USDC".into(),
                pair_type: dexq_core::PairType::NativeStable,
            },
            trade_size: dexq_core::TradeSize::K10,
            token_in: "ETH".into(),
            quotes: vec![
                quote("a", 100.0, 99.0, 100.0),
                quote("b", 101.0, 99.1, 100.0),
                quote("c", 102.0, 99.2, 100.0),
                quote("d", 500.0, 99.05, 100.0),
            ],
            timestamp: "t".into(),
        };
        assert_eq!(filter.apply(&mut trade), FilterOutcome::Filtered { removed: 1 });
        assert_eq!(trade.quotes.len(), 3);
    }
}
