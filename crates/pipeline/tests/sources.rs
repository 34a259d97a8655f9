//! Source discovery and loading against real directories.

use approx::assert_relative_eq;
use dexq_core::{Chain, Error, TradeSize};
use dexq_pipeline::{load_dataset, load_trades, DataSource, Dataset, ErrorReport, TradePipeline};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const CSV: &str = "timestamp,chain,chain_name,from_token,to_token,usd_amount,token_amount,project,expectedAmount,efficiency,latency_ms,from_amount_usd,to_amount_usd
2025-06-01 12:00:00,1,Mainnet,ETH,USDC,100000,40,odos,99950,99.95%,410,100000,99950
2025-06-01 12:00:00,1,Mainnet,ETH,USDC,100000,40,kyber,99900,99.90%,380,100000,99900
2025-06-01 12:00:00,1,Mainnet,ETH,USDC,100000,40,mock,99990,99.99%,10,100000,99990
2025-06-01 12:00:00,1,Mainnet,ETH,USDC,100000,40,0x,99800,99.80%
";

const RAW_JSON: &str = r#"[
  {"timestamp": "2025-06-01 12:05:00", "chain": "Base", "from_token": "USDC", "to_token": "USDT",
   "usd_amount": 9000, "token_amount": 9000, "project": "odos", "expectedAmount": 8999,
   "efficiency": "99.99%", "latency_ms": 250, "from_amount_usd": 0, "to_amount_usd": 0}
]"#;

const LEGACY_JSON: &str = r#"[{
  "id": "trade-900", "chain": "Polygon",
  "pair": {"tokenIn": "MATIC", "tokenOut": "USDC", "pairType": "Native-Stable"},
  "tradeSize": 500000, "tokenIn": "MATIC",
  "quotes": [{"aggregator": "odos", "price": 0.5, "efficiency": 99.0, "latency_ms": 90, "expectedAmount": 1}],
  "timestamp": "2025-06-01"
}]"#;

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn test_empty_directory_yields_no_trades() {
    let dir = TempDir::new().unwrap();
    assert_eq!(DataSource::discover(dir.path()), None);
    let trades = load_trades(dir.path(), &TradePipeline::default()).unwrap();
    assert!(trades.is_empty());
}

#[test]
fn test_csv_wins_over_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "quotes.csv", CSV);
    write(&dir, "quotes.json", RAW_JSON);
    write(&dir, "trades.json", LEGACY_JSON);

    let source = DataSource::discover(dir.path()).unwrap();
    assert!(matches!(source, DataSource::DelimitedText(_)));

    let trades = load_trades(dir.path(), &TradePipeline::default()).unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.id, "trade-001");
    assert_eq!(trade.chain, Chain::Ethereum);
    assert_eq!(trade.trade_size, TradeSize::K100);
    // mock is excluded and the short 0x row is malformed.
    let aggs: Vec<&str> = trade.quotes.iter().map(|q| q.aggregator.as_str()).collect();
    assert_eq!(aggs, vec!["odos", "kyber"]);
}

#[test]
fn test_raw_json_then_legacy() {
    let dir = TempDir::new().unwrap();
    write(&dir, "quotes.json", RAW_JSON);
    write(&dir, "trades.json", LEGACY_JSON);

    let trades = load_trades(dir.path(), &TradePipeline::default()).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].chain, Chain::Base);
    assert_eq!(trades[0].trade_size, TradeSize::K10);
    // USD legs are zero, so price falls back to token amounts.
    assert_relative_eq!(trades[0].quotes[0].price, 8999.0 / 9000.0);
}

#[test]
fn test_legacy_passthrough() {
    let dir = TempDir::new().unwrap();
    write(&dir, "trades.json", LEGACY_JSON);

    let trades = load_trades(dir.path(), &TradePipeline::default()).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].id, "trade-900");
    assert_eq!(trades[0].trade_size, TradeSize::K500);
}

#[test]
fn test_malformed_json_is_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "quotes.json", "{\"not\": \"an array\"}");

    let err = load_trades(dir.path(), &TradePipeline::default()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));

    let report = ErrorReport::new(&err, false);
    assert_eq!(report.error, "Failed to load data");
    assert!(report.details.is_none());
    assert!(ErrorReport::new(&err, true).details.is_some());
}

#[test]
fn test_legacy_file_is_returned_verbatim() {
    let dir = TempDir::new().unwrap();
    let legacy = r#"[
  {"id": "x-1", "chain": "Optimism", "tradeSize": 25000, "quotes": []},
  {"id": "x-2", "chain": "Mainnet", "note": "x",
   "pair": {"tokenIn": "ETH", "tokenOut": "USDC", "pairType": "Native-Stable"},
   "tradeSize": 10000, "tokenIn": "ETH", "quotes": [], "timestamp": "t"}
]"#;
    write(&dir, "trades.json", legacy);

    let dataset = load_dataset(dir.path(), &TradePipeline::default()).unwrap();
    assert!(matches!(dataset, Dataset::Legacy(_)));
    let out = dataset.to_json().unwrap();
    assert_eq!(out, serde_json::from_str::<Value>(legacy).unwrap());
    assert_eq!(out[1]["chain"], "Mainnet");
    assert_eq!(out[1]["note"], "x");

    // The typed view keeps only entries that fit the trade model.
    let trades = load_trades(dir.path(), &TradePipeline::default()).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].id, "x-2");
    assert_eq!(trades[0].chain, Chain::Ethereum);
}

#[test]
fn test_legacy_file_must_be_an_array() {
    let dir = TempDir::new().unwrap();
    write(&dir, "trades.json", "{\"id\": 1}");
    let err = load_trades(dir.path(), &TradePipeline::default()).unwrap_err();
    assert!(matches!(err, Error::Data(_)));
}
