//! Trade statistics for the dex quote analytics pipeline.
//!
//! This crate handles:
//! - Per-trade outlier rejection (IQR fences, latency ceiling, median deviation)
//! - Per-trade metrics (best/median price, efficiency, price difference, wins, latency)
//! - Cross-trade reports (win rates, median vs best, distributions)
//! - Aggregator-vs-aggregator and chain-vs-chain comparisons
//! - Trade selection filters

pub mod metrics;
pub mod outlier;
pub mod report;
pub mod filter;

pub use outlier::{FilterOutcome, OutlierFilter};
pub use report::{AggregatorComparison, ChainComparison, Report};
pub use filter::TradeFilter;
