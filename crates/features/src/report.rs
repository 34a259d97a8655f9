//! Cross-trade comparative statistics.
//!
//! Aggregates a set of trades into per-aggregator and per-chain summaries for
//! reporting. Every result lists keys in order of first appearance.

use crate::metrics::{
    self, average_latency, best_price, did_win, efficiency, median_latency, median_of_sorted,
    p95_latency, price_difference, sorted, winners,
};
use dexq_core::{Chain, Pair, Quote, Trade, TradeSize};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Accumulator keyed by first appearance.
struct FirstSeen<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K: Clone + Eq + Hash, V: Default> FirstSeen<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &K) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push((key.clone(), V::default()));
                self.index.insert(key.clone(), idx);
                idx
            }
        };
        &mut self.entries[idx].1
    }

    fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

/// Win rate of one aggregator (or chain).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRate {
    /// Aggregator or chain name.
    pub name: String,
    pub wins: u32,
    pub total: u32,
    /// Percentage of participations won.
    pub win_rate: f64,
}

impl WinRate {
    fn new(name: String, wins: u32, total: u32) -> Self {
        let win_rate = if total > 0 {
            wins as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            name,
            wins,
            total,
            win_rate,
        }
    }
}

/// Median aggregator price against the median best price, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedianVsBest {
    pub aggregator: String,
    pub median_vs_best: f64,
}

/// Five-number summary for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotStats {
    pub label: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxPlotStats {
    /// Summarize values with the median-of-halves quartile method.
    ///
    /// The lower half is the first `floor(n/2)` sorted values and the upper half
    /// starts at `ceil(n/2)`; an empty half falls back to min or max.
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Self {
        let label = label.into();
        if values.is_empty() {
            return Self {
                label,
                min: 0.0,
                q1: 0.0,
                median: 0.0,
                q3: 0.0,
                max: 0.0,
            };
        }

        let s = sorted(values.iter().copied());
        let n = s.len();
        let min = s[0];
        let max = s[n - 1];
        let lower = &s[..n / 2];
        let upper = &s[(n + 1) / 2..];

        Self {
            label,
            min,
            q1: if lower.is_empty() { min } else { median_of_sorted(lower) },
            median: median_of_sorted(&s),
            q3: if upper.is_empty() { max } else { median_of_sorted(upper) },
            max,
        }
    }
}

/// Latency distribution of one aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub aggregator: String,
    pub samples: usize,
    pub average: f64,
    pub median: f64,
    pub p95: f64,
}

/// Win rate per aggregator across all trades.
///
/// Each quote is one participation; it counts as a win when its aggregator is
/// among the trade's best-price winners.
pub fn win_rates(trades: &[Trade]) -> Vec<WinRate> {
    let mut acc: FirstSeen<String, (u32, u32)> = FirstSeen::new();

    for trade in trades.iter().filter(|t| !t.quotes.is_empty()) {
        let won: HashSet<&str> = winners(&trade.quotes).into_iter().collect();
        for quote in &trade.quotes {
            let (wins, total) = acc.entry(&quote.aggregator);
            *total += 1;
            if won.contains(quote.aggregator.as_str()) {
                *wins += 1;
            }
        }
    }

    acc.into_entries()
        .into_iter()
        .map(|(agg, (wins, total))| WinRate::new(agg, wins, total))
        .collect()
}

/// Win rate of one aggregator over the trades it quoted.
fn aggregator_win_rate<'t>(trades: impl IntoIterator<Item = &'t Trade>, aggregator: &str) -> WinRate {
    let mut wins = 0u32;
    let mut total = 0u32;
    for trade in trades.into_iter().filter(|t| t.quote_from(aggregator).is_some()) {
        total += 1;
        if did_win(aggregator, &trade.quotes) {
            wins += 1;
        }
    }
    WinRate::new(aggregator.to_string(), wins, total)
}

/// Win rates of two aggregators over the trades each of them quoted.
pub fn head_to_head(trades: &[Trade], first: &str, second: &str) -> [WinRate; 2] {
    [
        aggregator_win_rate(trades, first),
        aggregator_win_rate(trades, second),
    ]
}

/// Median price of each aggregator against the median best price of the trades
/// it quoted, as a percentage.
pub fn median_vs_best(trades: &[Trade]) -> Vec<MedianVsBest> {
    let mut acc: FirstSeen<String, (Vec<f64>, Vec<f64>)> = FirstSeen::new();

    for trade in trades.iter().filter(|t| !t.quotes.is_empty()) {
        let best = best_price(&trade.quotes);
        for quote in &trade.quotes {
            let (prices, bests) = acc.entry(&quote.aggregator);
            prices.push(quote.price);
            bests.push(best);
        }
    }

    acc.into_entries()
        .into_iter()
        .map(|(aggregator, (prices, bests))| {
            let median = metrics::median(prices);
            let best = metrics::median(bests);
            let median_vs_best = if best > 0.0 {
                (median - best) / best * 100.0
            } else {
                0.0
            };
            MedianVsBest {
                aggregator,
                median_vs_best,
            }
        })
        .collect()
}

/// Distribution of upstream efficiencies per aggregator.
///
/// A stored efficiency of zero is replaced with the derived one.
pub fn efficiency_distribution(trades: &[Trade]) -> Vec<BoxPlotStats> {
    let mut acc: FirstSeen<String, Vec<f64>> = FirstSeen::new();

    for trade in trades.iter().filter(|t| !t.quotes.is_empty()) {
        let best = best_price(&trade.quotes);
        for quote in &trade.quotes {
            let value = if quote.efficiency != 0.0 {
                quote.efficiency
            } else {
                efficiency(quote.price, best)
            };
            acc.entry(&quote.aggregator).push(value);
        }
    }

    acc.into_entries()
        .into_iter()
        .map(|(aggregator, values)| BoxPlotStats::from_values(aggregator, &values))
        .collect()
}

/// Distribution of price differences from the best price, per chain.
pub fn price_difference_by_chain(trades: &[Trade]) -> Vec<BoxPlotStats> {
    let mut acc: FirstSeen<Chain, Vec<f64>> = FirstSeen::new();

    for trade in trades {
        let best = best_price(&trade.quotes);
        let values = acc.entry(&trade.chain);
        values.extend(trade.quotes.iter().map(|q| price_difference(q.price, best)));
    }

    acc.into_entries()
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(chain, values)| BoxPlotStats::from_values(chain.as_str(), &values))
        .collect()
}

/// Latency statistics per aggregator.
pub fn latency_stats(trades: &[Trade]) -> Vec<LatencyStats> {
    let mut acc: FirstSeen<String, Vec<Quote>> = FirstSeen::new();

    for quote in trades.iter().flat_map(|t| &t.quotes) {
        acc.entry(&quote.aggregator).push(quote.clone());
    }

    acc.into_entries()
        .into_iter()
        .map(|(aggregator, quotes)| LatencyStats {
            aggregator,
            samples: quotes.len(),
            average: average_latency(&quotes),
            median: median_latency(&quotes),
            p95: p95_latency(&quotes),
        })
        .collect()
}

/// Share of quotes at the best price, per chain.
///
/// Tied winners all count, so this is the average win rate of the aggregators
/// quoting on that chain.
pub fn chain_win_rates(trades: &[Trade]) -> Vec<WinRate> {
    let mut acc: FirstSeen<Chain, (u32, u32)> = FirstSeen::new();

    for trade in trades {
        let (wins, total) = acc.entry(&trade.chain);
        *wins += winners(&trade.quotes).len() as u32;
        *total += trade.quotes.len() as u32;
    }

    acc.into_entries()
        .into_iter()
        .map(|(chain, (wins, total))| WinRate::new(chain.to_string(), wins, total))
        .collect()
}

/// Pair label used for grouping (`ETH-USDC`).
pub fn pair_label(pair: &Pair) -> String {
    format!("{}-{}", pair.token_in, pair.token_out)
}

/// Two win rates measured within one group of trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWinRates {
    /// Chain, pair or size the trades share.
    pub group: String,
    pub rates: [WinRate; 2],
}

fn group_trades<K, F>(trades: &[Trade], key: F) -> Vec<(K, Vec<&Trade>)>
where
    K: Clone + Eq + Hash,
    F: Fn(&Trade) -> K,
{
    let mut acc: FirstSeen<K, Vec<&Trade>> = FirstSeen::new();
    for trade in trades {
        acc.entry(&key(trade)).push(trade);
    }
    acc.into_entries()
}

fn grouped_head_to_head<K, F, L>(trades: &[Trade], first: &str, second: &str, key: F, label: L) -> Vec<GroupWinRates>
where
    K: Clone + Eq + Hash,
    F: Fn(&Trade) -> K,
    L: Fn(&K) -> String,
{
    group_trades(trades, key)
        .into_iter()
        .map(|(group, members)| GroupWinRates {
            group: label(&group),
            rates: [
                aggregator_win_rate(members.iter().copied(), first),
                aggregator_win_rate(members.iter().copied(), second),
            ],
        })
        .collect()
}

/// Head-to-head win rates of two aggregators within each chain.
pub fn head_to_head_by_chain(trades: &[Trade], first: &str, second: &str) -> Vec<GroupWinRates> {
    grouped_head_to_head(trades, first, second, |t| t.chain, |c: &Chain| c.to_string())
}

/// Head-to-head win rates of two aggregators within each pair.
pub fn head_to_head_by_pair(trades: &[Trade], first: &str, second: &str) -> Vec<GroupWinRates> {
    grouped_head_to_head(trades, first, second, |t| pair_label(&t.pair), |p: &String| p.clone())
}

/// Price differences of two aggregators, one box per (aggregator, group).
///
/// Boxes are labelled `"<aggregator> - <group>"`; empty ones are left out.
fn grouped_price_difference<K, F, L>(
    trades: &[Trade],
    first: &str,
    second: &str,
    key: F,
    label: L,
) -> Vec<BoxPlotStats>
where
    K: Clone + Eq + Hash,
    F: Fn(&Trade) -> K,
    L: Fn(&K) -> String,
{
    let mut acc: FirstSeen<K, [Vec<f64>; 2]> = FirstSeen::new();

    for trade in trades {
        let best = best_price(&trade.quotes);
        let [a, b] = acc.entry(&key(trade));
        for quote in &trade.quotes {
            let diff = price_difference(quote.price, best);
            if quote.aggregator == first {
                a.push(diff);
            }
            if quote.aggregator == second {
                b.push(diff);
            }
        }
    }

    let mut boxes = Vec::new();
    for (group, [a, b]) in acc.into_entries() {
        let group = label(&group);
        for (aggregator, values) in [(first, a), (second, b)] {
            if !values.is_empty() {
                boxes.push(BoxPlotStats::from_values(format!("{aggregator} - {group}"), &values));
            }
        }
    }
    boxes
}

/// Price differences of two aggregators per chain.
pub fn aggregator_price_difference_by_chain(trades: &[Trade], first: &str, second: &str) -> Vec<BoxPlotStats> {
    grouped_price_difference(trades, first, second, |t| t.chain, |c: &Chain| c.to_string())
}

/// Price differences of two aggregators per pair.
pub fn aggregator_price_difference_by_pair(trades: &[Trade], first: &str, second: &str) -> Vec<BoxPlotStats> {
    grouped_price_difference(trades, first, second, |t| pair_label(&t.pair), |p: &String| p.clone())
}

/// Price differences of two aggregators per trade size (labelled in USD).
pub fn aggregator_price_difference_by_size(trades: &[Trade], first: &str, second: &str) -> Vec<BoxPlotStats> {
    grouped_price_difference(trades, first, second, |t| t.trade_size, |s: &TradeSize| s.usd().to_string())
}

/// Chain win rates of two chains within each pair.
///
/// Pairs come from every trade, so a pair quoted on neither chain yields zero rates.
pub fn chain_win_rates_by_pair(trades: &[Trade], first: Chain, second: Chain) -> Vec<GroupWinRates> {
    let mut acc: FirstSeen<String, [(u32, u32); 2]> = FirstSeen::new();

    for trade in trades {
        let counts = acc.entry(&pair_label(&trade.pair));
        for (slot, chain) in [first, second].into_iter().enumerate() {
            if trade.chain == chain {
                counts[slot].0 += winners(&trade.quotes).len() as u32;
                counts[slot].1 += trade.quotes.len() as u32;
            }
        }
    }

    acc.into_entries()
        .into_iter()
        .map(|(group, [(w1, t1), (w2, t2)])| GroupWinRates {
            group,
            rates: [
                WinRate::new(first.to_string(), w1, t1),
                WinRate::new(second.to_string(), w2, t2),
            ],
        })
        .collect()
}

/// Price differences of all quotes on each of two chains.
pub fn chain_price_difference(trades: &[Trade], first: Chain, second: Chain) -> Vec<BoxPlotStats> {
    let mut values: [Vec<f64>; 2] = Default::default();

    for trade in trades {
        let best = best_price(&trade.quotes);
        for (slot, chain) in [first, second].into_iter().enumerate() {
            if trade.chain == chain {
                values[slot].extend(trade.quotes.iter().map(|q| price_difference(q.price, best)));
            }
        }
    }

    [(first, &values[0]), (second, &values[1])]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(chain, v)| BoxPlotStats::from_values(chain.as_str(), v))
        .collect()
}

/// Price differences per aggregator on each of two chains.
///
/// Boxes are labelled `"<chain> - <aggregator>"`; aggregators follow their first
/// appearance across all trades.
pub fn chain_price_difference_by_aggregator(trades: &[Trade], first: Chain, second: Chain) -> Vec<BoxPlotStats> {
    let mut acc: FirstSeen<String, [Vec<f64>; 2]> = FirstSeen::new();

    for trade in trades {
        let slot = if trade.chain == first {
            Some(0)
        } else if trade.chain == second {
            Some(1)
        } else {
            None
        };
        let best = best_price(&trade.quotes);
        for quote in &trade.quotes {
            let values = acc.entry(&quote.aggregator);
            if let Some(slot) = slot {
                values[slot].push(price_difference(quote.price, best));
            }
        }
    }

    let mut boxes = Vec::new();
    for (aggregator, [a, b]) in acc.into_entries() {
        for (chain, values) in [(first, a), (second, b)] {
            if !values.is_empty() {
                boxes.push(BoxPlotStats::from_values(format!("{chain} - {aggregator}"), &values));
            }
        }
    }
    boxes
}

/// Two aggregators compared overall and by chain, pair and size.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorComparison {
    pub head_to_head: [WinRate; 2],
    pub by_chain: Vec<GroupWinRates>,
    pub by_pair: Vec<GroupWinRates>,
    pub price_difference_by_chain: Vec<BoxPlotStats>,
    pub price_difference_by_pair: Vec<BoxPlotStats>,
    pub price_difference_by_size: Vec<BoxPlotStats>,
}

impl AggregatorComparison {
    pub fn build(trades: &[Trade], first: &str, second: &str) -> Self {
        Self {
            head_to_head: head_to_head(trades, first, second),
            by_chain: head_to_head_by_chain(trades, first, second),
            by_pair: head_to_head_by_pair(trades, first, second),
            price_difference_by_chain: aggregator_price_difference_by_chain(trades, first, second),
            price_difference_by_pair: aggregator_price_difference_by_pair(trades, first, second),
            price_difference_by_size: aggregator_price_difference_by_size(trades, first, second),
        }
    }
}

/// Two chains compared by pair and by aggregator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainComparison {
    pub win_rates_by_pair: Vec<GroupWinRates>,
    pub price_difference: Vec<BoxPlotStats>,
    pub price_difference_by_aggregator: Vec<BoxPlotStats>,
}

impl ChainComparison {
    pub fn build(trades: &[Trade], first: Chain, second: Chain) -> Self {
        Self {
            win_rates_by_pair: chain_win_rates_by_pair(trades, first, second),
            price_difference: chain_price_difference(trades, first, second),
            price_difference_by_aggregator: chain_price_difference_by_aggregator(trades, first, second),
        }
    }
}

/// Latest timestamp by lexicographic order.
pub fn latest_timestamp(trades: &[Trade]) -> Option<&str> {
    trades.iter().map(|t| t.timestamp.as_str()).max()
}

/// Distinct pairs by (input, output) token, first-seen order.
pub fn available_pairs(trades: &[Trade]) -> Vec<Pair> {
    let mut seen = HashSet::new();
    trades
        .iter()
        .filter(|t| seen.insert((t.pair.token_in.as_str(), t.pair.token_out.as_str())))
        .map(|t| t.pair.clone())
        .collect()
}

/// Distinct aggregator names, first-seen order.
pub fn available_aggregators(trades: &[Trade]) -> Vec<String> {
    let mut seen = HashSet::new();
    trades
        .iter()
        .flat_map(|t| &t.quotes)
        .filter(|q| seen.insert(q.aggregator.as_str()))
        .map(|q| q.aggregator.clone())
        .collect()
}

/// All summaries computed over one trade set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub trade_count: usize,
    pub latest_timestamp: Option<String>,
    pub aggregators: Vec<String>,
    pub pairs: Vec<Pair>,
    pub win_rates: Vec<WinRate>,
    pub median_vs_best: Vec<MedianVsBest>,
    pub efficiency: Vec<BoxPlotStats>,
    pub latency: Vec<LatencyStats>,
    pub chain_win_rates: Vec<WinRate>,
    pub chain_price_difference: Vec<BoxPlotStats>,
}

impl Report {
    /// Compute every summary.
    pub fn build(trades: &[Trade]) -> Self {
        Self {
            trade_count: trades.len(),
            latest_timestamp: latest_timestamp(trades).map(str::to_string),
            aggregators: available_aggregators(trades),
            pairs: available_pairs(trades),
            win_rates: win_rates(trades),
            median_vs_best: median_vs_best(trades),
            efficiency: efficiency_distribution(trades),
            latency: latency_stats(trades),
            chain_win_rates: chain_win_rates(trades),
            chain_price_difference: price_difference_by_chain(trades),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dexq_core::{PairType, TradeSize};

    fn quote(aggregator: &str, price: f64, efficiency: f64, latency_ms: f64) -> Quote {
        Quote {
            aggregator: aggregator.to_string(),
            price,
            efficiency,
            latency_ms,
            expected_amount: 0.0,
        }
    }

    fn trade(id: &str, chain: Chain, ts: &str, quotes: Vec<Quote>) -> Trade {
        Trade {
            id: id.to_string(),
            chain,
            pair: Pair {
                token_in: "ETH".into(),
                token_out: "USDC".into(),
                pair_type: PairType::NativeStable,
            },
            trade_size: TradeSize::K10,
            token_in: "ETH".into(),
            quotes,
            timestamp: ts.to_string(),
        }
    }

    fn sample() -> Vec<Trade> {
        vec![
            trade(
                "trade-001",
                Chain::Base,
                "2025-01-01 00:00",
                vec![
                    quote("odos", 1.00, 99.9, 100.0),
                    quote("kyber", 1.00, 99.9, 300.0),
                    quote("0x", 1.02, 98.0, 200.0),
                ],
            ),
            trade(
                "trade-002",
                Chain::Arbitrum,
                "2025-01-02 00:00",
                vec![quote("kyber", 2.00, 99.0, 500.0), quote("odos", 2.10, 0.0, 700.0)],
            ),
            trade("trade-003", Chain::Base, "2024-12-31 00:00", vec![]),
        ]
    }

    #[test]
    fn test_win_rates_count_ties() {
        let rates = win_rates(&sample());
        let names: Vec<&str> = rates.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["odos", "kyber", "0x"]);

        assert_eq!((rates[0].wins, rates[0].total), (1, 2));
        assert_eq!((rates[1].wins, rates[1].total), (2, 2));
        assert_eq!((rates[2].wins, rates[2].total), (0, 1));
        assert_relative_eq!(rates[0].win_rate, 50.0);
        assert_relative_eq!(rates[1].win_rate, 100.0);
    }

    #[test]
    fn test_head_to_head() {
        let [odos, zero_x] = head_to_head(&sample(), "odos", "0x");
        assert_eq!((odos.wins, odos.total), (1, 2));
        assert_eq!((zero_x.wins, zero_x.total), (0, 1));

        let [missing, _] = head_to_head(&sample(), "paraswap", "odos");
        assert_eq!(missing.total, 0);
        assert_eq!(missing.win_rate, 0.0);
    }

    #[test]
    fn test_median_vs_best() {
        let rows = median_vs_best(&sample());
        // odos prices [1.00, 2.10] -> 1.55, best [1.00, 2.00] -> 1.5
        assert_eq!(rows[0].aggregator, "odos");
        assert_relative_eq!(rows[0].median_vs_best, (1.55 - 1.5) / 1.5 * 100.0, epsilon = 1e-9);
        // kyber always best
        assert_relative_eq!(rows[1].median_vs_best, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_efficiency_distribution_falls_back_to_derived() {
        let dist = efficiency_distribution(&sample());
        let odos = &dist[0];
        assert_eq!(odos.label, "odos");
        // 99.9 stored, and 2.0 / 2.1 * 100 derived
        assert_relative_eq!(odos.min, 2.0 / 2.1 * 100.0, epsilon = 1e-9);
        assert_relative_eq!(odos.max, 99.9);
    }

    #[test]
    fn test_box_plot_quartiles() {
        let stats = BoxPlotStats::from_values("x", &[7.0, 1.0, 3.0, 5.0, 9.0]);
        // lower [1, 3], upper [7, 9]
        assert_eq!((stats.min, stats.q1, stats.median, stats.q3, stats.max), (1.0, 2.0, 5.0, 8.0, 9.0));

        let single = BoxPlotStats::from_values("y", &[4.0]);
        assert_eq!((single.q1, single.median, single.q3), (4.0, 4.0, 4.0));

        let empty = BoxPlotStats::from_values("z", &[]);
        assert_eq!(empty.max, 0.0);
    }

    #[test]
    fn test_latency_stats() {
        let stats = latency_stats(&sample());
        let odos = &stats[0];
        assert_eq!(odos.samples, 2);
        assert_relative_eq!(odos.average, 400.0);
        assert_relative_eq!(odos.median, 400.0);
        assert_eq!(odos.p95, 700.0);
    }

    #[test]
    fn test_chain_win_rates() {
        let rates = chain_win_rates(&sample());
        assert_eq!(rates[0].name, "Base");
        assert_eq!((rates[0].wins, rates[0].total), (2, 3));
        assert_eq!(rates[1].name, "Arbitrum");
        assert_eq!((rates[1].wins, rates[1].total), (1, 2));
    }

    #[test]
    fn test_price_difference_by_chain() {
        let stats = price_difference_by_chain(&sample());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "Base");
        assert_relative_eq!(stats[0].max, 2.0, epsilon = 1e-9);
        assert_relative_eq!(stats[1].max, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_available_sets_and_latest() {
        let trades = sample();
        assert_eq!(available_aggregators(&trades), vec!["odos", "kyber", "0x"]);
        assert_eq!(available_pairs(&trades).len(), 1);
        assert_eq!(latest_timestamp(&trades), Some("2025-01-02 00:00"));
        assert_eq!(latest_timestamp(&[]), None);
    }

    #[test]
    fn test_report_build() {
        let report = Report::build(&sample());
        assert_eq!(report.trade_count, 3);
        assert_eq!(report.win_rates.len(), 3);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["winRates"].is_array());
        assert_eq!(value["winRates"][0]["winRate"], 50.0);
    }

    fn trade_on(chain: Chain, from: &str, to: &str, size: TradeSize, quotes: Vec<Quote>) -> Trade {
        Trade {
            id: String::new(),
            chain,
            pair: Pair {
                token_in: from.into(),
                token_out: to.into(),
                pair_type: PairType::NativeStable,
            },
            trade_size: size,
            token_in: from.into(),
            quotes,
            timestamp: String::new(),
        }
    }

    fn comparison_sample() -> Vec<Trade> {
        vec![
            trade_on(
                Chain::Base,
                "ETH",
                "USDC",
                TradeSize::K10,
                vec![quote("odos", 1.00, 99.0, 1.0), quote("kyber", 1.01, 99.0, 1.0), quote("0x", 1.02, 99.0, 1.0)],
            ),
            trade_on(
                Chain::Base,
                "USDC",
                "DAI",
                TradeSize::K50,
                vec![quote("odos", 1.01, 99.0, 1.0), quote("kyber", 1.00, 99.0, 1.0)],
            ),
            trade_on(
                Chain::Arbitrum,
                "ETH",
                "USDC",
                TradeSize::K10,
                vec![quote("kyber", 2.00, 99.0, 1.0), quote("odos", 2.00, 99.0, 1.0)],
            ),
            trade_on(Chain::Polygon, "ETH", "USDC", TradeSize::K50, vec![quote("0x", 3.0, 99.0, 1.0)]),
        ]
    }

    fn counts(group: &GroupWinRates) -> [(u32, u32); 2] {
        [
            (group.rates[0].wins, group.rates[0].total),
            (group.rates[1].wins, group.rates[1].total),
        ]
    }

    fn labels(boxes: &[BoxPlotStats]) -> Vec<&str> {
        boxes.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_head_to_head_by_chain() {
        let groups = head_to_head_by_chain(&comparison_sample(), "odos", "kyber");
        let names: Vec<&str> = groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(names, vec!["Base", "Arbitrum", "Polygon"]);
        assert_eq!(counts(&groups[0]), [(1, 2), (1, 2)]);
        // tied quotes both win
        assert_eq!(counts(&groups[1]), [(1, 1), (1, 1)]);
        assert_eq!(counts(&groups[2]), [(0, 0), (0, 0)]);
        assert_eq!(groups[2].rates[0].win_rate, 0.0);
    }

    #[test]
    fn test_head_to_head_by_pair() {
        let groups = head_to_head_by_pair(&comparison_sample(), "odos", "kyber");
        assert_eq!(groups[0].group, "ETH-USDC");
        assert_eq!(counts(&groups[0]), [(2, 2), (1, 2)]);
        assert_eq!(groups[1].group, "USDC-DAI");
        assert_eq!(counts(&groups[1]), [(0, 1), (1, 1)]);
    }

    #[test]
    fn test_aggregator_price_difference_groups() {
        let trades = comparison_sample();

        let by_chain = aggregator_price_difference_by_chain(&trades, "odos", "kyber");
        assert_eq!(
            labels(&by_chain),
            vec!["odos - Base", "kyber - Base", "odos - Arbitrum", "kyber - Arbitrum"]
        );
        assert_relative_eq!(by_chain[0].max, 1.0, epsilon = 1e-9);

        let by_pair = aggregator_price_difference_by_pair(&trades, "odos", "kyber");
        assert_eq!(
            labels(&by_pair),
            vec!["odos - ETH-USDC", "kyber - ETH-USDC", "odos - USDC-DAI", "kyber - USDC-DAI"]
        );

        let by_size = aggregator_price_difference_by_size(&trades, "odos", "kyber");
        assert_eq!(
            labels(&by_size),
            vec!["odos - 10000", "kyber - 10000", "odos - 50000", "kyber - 50000"]
        );
        assert_eq!(by_size[0].max, 0.0);
        assert_relative_eq!(by_size[1].max, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_chain_win_rates_by_pair() {
        let groups = chain_win_rates_by_pair(&comparison_sample(), Chain::Base, Chain::Arbitrum);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, "ETH-USDC");
        assert_eq!(groups[0].rates[0].name, "Base");
        assert_eq!(counts(&groups[0]), [(1, 3), (2, 2)]);
        assert_eq!(groups[1].group, "USDC-DAI");
        assert_eq!(counts(&groups[1]), [(1, 2), (0, 0)]);
    }

    #[test]
    fn test_chain_price_difference() {
        let trades = comparison_sample();

        let overall = chain_price_difference(&trades, Chain::Base, Chain::Arbitrum);
        assert_eq!(labels(&overall), vec!["Base", "Arbitrum"]);
        assert_relative_eq!(overall[0].max, 2.0, epsilon = 1e-9);
        assert_eq!(overall[1].max, 0.0);

        let none = chain_price_difference(&trades, Chain::Monad, Chain::HyperEVM);
        assert!(none.is_empty());

        let by_agg = chain_price_difference_by_aggregator(&trades, Chain::Base, Chain::Arbitrum);
        assert_eq!(
            labels(&by_agg),
            vec!["Base - odos", "Arbitrum - odos", "Base - kyber", "Arbitrum - kyber", "Base - 0x"]
        );
    }

    #[test]
    fn test_comparison_json_shape() {
        let trades = comparison_sample();
        let aggs = serde_json::to_value(AggregatorComparison::build(&trades, "odos", "kyber")).unwrap();
        assert_eq!(aggs["headToHead"][0]["name"], "odos");
        assert_eq!(aggs["byChain"][0]["group"], "Base");
        assert!(aggs["priceDifferenceBySize"].is_array());

        let chains = serde_json::to_value(ChainComparison::build(&trades, Chain::Base, Chain::Arbitrum)).unwrap();
        assert_eq!(chains["winRatesByPair"][0]["rates"][1]["name"], "Arbitrum");
        assert_eq!(chains["priceDifference"].as_array().unwrap().len(), 2);
    }
}
