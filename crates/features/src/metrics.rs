//! Per-trade price and latency metrics.
//!
//! All functions are total: empty input yields `0.0` (or `false`), never a panic.

use dexq_core::Quote;
use ordered_float::OrderedFloat;
use statrs::statistics::Statistics;

/// Sort a copy of `values` ascending.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.into_iter().collect();
    v.sort_by_key(|x| OrderedFloat(*x));
    v
}

/// Median of already sorted values; mean of the two middle values for even length.
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median of unsorted values.
pub fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    median_of_sorted(&sorted(values))
}

/// Best (minimum) price across quotes.
pub fn best_price(quotes: &[Quote]) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    quotes.iter().map(|q| q.price).fold(f64::INFINITY, f64::min)
}

/// Median quote price.
pub fn median_price(quotes: &[Quote]) -> f64 {
    median(quotes.iter().map(|q| q.price))
}

/// Median quote latency in ms.
pub fn median_latency(quotes: &[Quote]) -> f64 {
    median(quotes.iter().map(|q| q.latency_ms))
}

/// Mean quote latency in ms.
pub fn average_latency(quotes: &[Quote]) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    quotes.iter().map(|q| q.latency_ms).mean()
}

/// 95th percentile latency (nearest rank: index `ceil(0.95 n) - 1`).
pub fn p95_latency(quotes: &[Quote]) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    let latencies = sorted(quotes.iter().map(|q| q.latency_ms));
    let rank = (latencies.len() as f64 * 0.95).ceil() as usize;
    latencies[rank.saturating_sub(1)]
}

/// Derived efficiency: `best / price * 100`, or `0.0` when there is no best price.
///
/// Independent from [`Quote::efficiency`], which comes from upstream data.
pub fn efficiency(price: f64, best_price: f64) -> f64 {
    if best_price == 0.0 {
        return 0.0;
    }
    best_price / price * 100.0
}

/// Percentage distance from the best price: `(price - best) / best * 100`.
pub fn price_difference(price: f64, best_price: f64) -> f64 {
    if best_price == 0.0 {
        return 0.0;
    }
    (price - best_price) / best_price * 100.0
}

/// Whether the aggregator's quote matches the best price exactly.
///
/// Ties are all winners. An aggregator with no quote in the trade did not win.
pub fn did_win(aggregator: &str, quotes: &[Quote]) -> bool {
    let best = best_price(quotes);
    quotes
        .iter()
        .find(|q| q.aggregator == aggregator)
        .map_or(false, |q| q.price == best)
}

/// Aggregators whose quote equals the best price, in quote order.
pub fn winners(quotes: &[Quote]) -> Vec<&str> {
    let best = best_price(quotes);
    quotes
        .iter()
        .filter(|q| q.price == best)
        .map(|q| q.aggregator.as_str())
        .collect()
}
