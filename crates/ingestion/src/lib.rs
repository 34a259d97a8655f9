//! Data ingestion for the dex quote analytics pipeline.
//!
//! This crate handles:
//! - Delimited text parsing (tab/comma auto-detection)
//! - Quote validation (aggregator exclusion, efficiency range)
//! - Trade grouping (composite key, chain normalization, size buckets, pricing)

pub mod parser;
pub mod validator;
pub mod grouper;

pub use parser::{detect_delimiter, parse_delimited};
pub use validator::{parse_efficiency, QuoteValidator};
pub use grouper::{normalize_chain, pair_type, quote_price, round_to_trade_size, TradeGrouper};
