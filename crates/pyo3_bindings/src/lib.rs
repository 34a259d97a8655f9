//! PyO3 bindings for the dex quote analytics pipeline.
//!
//! Exposes the Rust implementation to Python:
//! - Quote and trade views
//! - The raw record to trade pipeline
//! - Per-trade metrics and the cross-trade report (as JSON)

use std::path::PathBuf;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use dexq_core::{
    Chain,
    Error as RustError,
    PipelineConfig,
    Quote as RustQuote,
    Trade as RustTrade,
};
use dexq_features::{metrics, AggregatorComparison, ChainComparison, Report, TradeFilter};
use dexq_pipeline::{load_dataset, load_trades as rust_load_trades, TradePipeline};

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| to_py_err(e.into()))
}

fn parse_chain(name: &str) -> PyResult<Chain> {
    name.parse().map_err(PyValueError::new_err)
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One aggregator's offer within a trade.
#[pyclass]
#[derive(Clone)]
pub struct Quote {
    #[pyo3(get, set)]
    pub aggregator: String,
    #[pyo3(get, set)]
    pub price: f64,
    #[pyo3(get, set)]
    pub efficiency: f64,
    #[pyo3(get, set)]
    pub latency_ms: f64,
    #[pyo3(get, set)]
    pub expected_amount: f64,
}

#[pymethods]
impl Quote {
    #[new]
    #[pyo3(signature = (aggregator, price, efficiency, latency_ms, expected_amount = 0.0))]
    fn new(aggregator: String, price: f64, efficiency: f64, latency_ms: f64, expected_amount: f64) -> Self {
        Quote { aggregator, price, efficiency, latency_ms, expected_amount }
    }

    fn __repr__(&self) -> String {
        format!(
            "Quote(aggregator={}, price={}, efficiency={:.2}, latency_ms={})",
            self.aggregator, self.price, self.efficiency, self.latency_ms
        )
    }
}

impl From<Quote> for RustQuote {
    fn from(q: Quote) -> Self {
        RustQuote {
            aggregator: q.aggregator,
            price: q.price,
            efficiency: q.efficiency,
            latency_ms: q.latency_ms,
            expected_amount: q.expected_amount,
        }
    }
}

impl From<RustQuote> for Quote {
    fn from(q: RustQuote) -> Self {
        Quote {
            aggregator: q.aggregator,
            price: q.price,
            efficiency: q.efficiency,
            latency_ms: q.latency_ms,
            expected_amount: q.expected_amount,
        }
    }
}

/// A grouped trade (read-only view).
#[pyclass]
#[derive(Clone)]
pub struct Trade {
    #[pyo3(get)]
    pub id: String,
    #[pyo3(get)]
    pub chain: String,
    #[pyo3(get)]
    pub token_in: String,
    #[pyo3(get)]
    pub token_out: String,
    #[pyo3(get)]
    pub pair_type: String,
    #[pyo3(get)]
    pub trade_size: u64,
    #[pyo3(get)]
    pub timestamp: String,
    #[pyo3(get)]
    pub quotes: Vec<Quote>,
}

#[pymethods]
impl Trade {
    /// Lowest quoted price.
    #[getter]
    fn best_price(&self) -> f64 {
        metrics::best_price(&self.rust_quotes())
    }

    /// Aggregators quoting the best price.
    #[getter]
    fn winners(&self) -> Vec<String> {
        let quotes = self.rust_quotes();
        metrics::winners(&quotes).into_iter().map(str::to_string).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "Trade(id={}, chain={}, pair={}/{}, size={}, quotes={})",
            self.id,
            self.chain,
            self.token_in,
            self.token_out,
            self.trade_size,
            self.quotes.len()
        )
    }
}

impl Trade {
    fn rust_quotes(&self) -> Vec<RustQuote> {
        self.quotes.iter().cloned().map(Into::into).collect()
    }
}

impl From<RustTrade> for Trade {
    fn from(t: RustTrade) -> Self {
        Trade {
            id: t.id,
            chain: t.chain.to_string(),
            token_in: t.pair.token_in,
            token_out: t.pair.token_out,
            pair_type: match t.pair.pair_type {
                dexq_core::PairType::NativeStable => "Native-Stable".to_string(),
                dexq_core::PairType::StableStable => "Stable-Stable".to_string(),
            },
            trade_size: t.trade_size.usd(),
            timestamp: t.timestamp,
            quotes: t.quotes.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Raw record to trade pipeline.
#[pyclass]
pub struct PyTradePipeline {
    inner: TradePipeline,
}

#[pymethods]
impl PyTradePipeline {
    #[new]
    fn new() -> Self {
        PyTradePipeline {
            inner: TradePipeline::default(),
        }
    }

    /// Create from a JSON configuration document.
    #[staticmethod]
    fn with_config(config_json: &str) -> PyResult<Self> {
        let config = PipelineConfig::from_json_str(config_json).map_err(to_py_err)?;
        let inner = TradePipeline::new(config).map_err(to_py_err)?;
        Ok(PyTradePipeline { inner })
    }

    /// Transform delimited text into trades.
    fn run_text(&self, content: &str) -> Vec<Trade> {
        self.inner.run_text(content).into_iter().map(Into::into).collect()
    }

    /// Transform delimited text into the trade list as JSON.
    fn run_text_json(&self, content: &str) -> PyResult<String> {
        to_json(&self.inner.run_text(content))
    }

    /// Load trades from the best source in a data directory.
    fn load(&self, data_dir: PathBuf) -> PyResult<Vec<Trade>> {
        let trades = rust_load_trades(&data_dir, &self.inner).map_err(to_py_err)?;
        Ok(trades.into_iter().map(Into::into).collect())
    }

    /// Build the cross-trade report for a data directory as JSON.
    ///
    /// `filter_json` is an optional trade filter document.
    #[pyo3(signature = (data_dir, filter_json = None))]
    fn report_json(&self, data_dir: PathBuf, filter_json: Option<&str>) -> PyResult<String> {
        let trades = rust_load_trades(&data_dir, &self.inner).map_err(to_py_err)?;
        let filter: TradeFilter = match filter_json {
            Some(json) => serde_json::from_str(json).map_err(|e| to_py_err(e.into()))?,
            None => TradeFilter::default(),
        };
        let selected: Vec<RustTrade> = filter.apply(&trades).into_iter().cloned().collect();
        to_json(&Report::build(&selected))
    }

    /// Compare two aggregators over a data directory; returns JSON.
    fn compare_aggregators_json(&self, data_dir: PathBuf, first: &str, second: &str) -> PyResult<String> {
        let trades = rust_load_trades(&data_dir, &self.inner).map_err(to_py_err)?;
        to_json(&AggregatorComparison::build(&trades, first, second))
    }

    /// Compare two chains over a data directory; returns JSON.
    fn compare_chains_json(&self, data_dir: PathBuf, first: &str, second: &str) -> PyResult<String> {
        let (first, second) = (parse_chain(first)?, parse_chain(second)?);
        let trades = rust_load_trades(&data_dir, &self.inner).map_err(to_py_err)?;
        to_json(&ChainComparison::build(&trades, first, second))
    }
}

// ============================================================================
// Module Functions
// ============================================================================

/// Transform delimited text with the default configuration; returns trade JSON.
#[pyfunction]
fn transform_text(content: &str) -> PyResult<String> {
    to_json(&TradePipeline::default().run_text(content))
}

/// Load a data directory with the default configuration; returns trade JSON.
///
/// A legacy `trades.json` comes back exactly as stored.
#[pyfunction]
fn load_trades(data_dir: PathBuf) -> PyResult<String> {
    let dataset = load_dataset(&data_dir, &TradePipeline::default()).map_err(to_py_err)?;
    to_json(&dataset.to_json().map_err(to_py_err)?)
}

// ============================================================================
// Metrics
// ============================================================================

fn priced(prices: Vec<f64>) -> Vec<RustQuote> {
    prices
        .into_iter()
        .map(|price| RustQuote { price, ..placeholder() })
        .collect()
}

fn timed(latencies: Vec<f64>) -> Vec<RustQuote> {
    latencies
        .into_iter()
        .map(|latency_ms| RustQuote { latency_ms, ..placeholder() })
        .collect()
}

fn placeholder() -> RustQuote {
    RustQuote {
        aggregator: String::new(),
        price: 0.0,
        efficiency: 0.0,
        latency_ms: 0.0,
        expected_amount: 0.0,
    }
}

/// Lowest price (0.0 when empty).
#[pyfunction]
fn best_price(prices: Vec<f64>) -> f64 {
    metrics::best_price(&priced(prices))
}

/// Median price (0.0 when empty).
#[pyfunction]
fn median_price(prices: Vec<f64>) -> f64 {
    metrics::median_price(&priced(prices))
}

/// Median latency (0.0 when empty).
#[pyfunction]
fn median_latency(latencies: Vec<f64>) -> f64 {
    metrics::median_latency(&timed(latencies))
}

/// 95th percentile latency (0.0 when empty).
#[pyfunction]
fn p95_latency(latencies: Vec<f64>) -> f64 {
    metrics::p95_latency(&timed(latencies))
}

/// Best price as a percentage of `price`.
#[pyfunction]
fn efficiency(price: f64, best_price: f64) -> f64 {
    metrics::efficiency(price, best_price)
}

/// Percent difference of a price from the best price.
#[pyfunction]
fn price_difference(price: f64, best_price: f64) -> f64 {
    metrics::price_difference(price, best_price)
}

// ============================================================================
// Module Definition
// ============================================================================

#[pymodule]
fn dexq(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Quote>()?;
    m.add_class::<Trade>()?;

    // Pipeline
    m.add_class::<PyTradePipeline>()?;
    m.add_function(wrap_pyfunction!(transform_text, m)?)?;
    m.add_function(wrap_pyfunction!(load_trades, m)?)?;

    // Metrics
    m.add_function(wrap_pyfunction!(best_price, m)?)?;
    m.add_function(wrap_pyfunction!(median_price, m)?)?;
    m.add_function(wrap_pyfunction!(median_latency, m)?)?;
    m.add_function(wrap_pyfunction!(p95_latency, m)?)?;
    m.add_function(wrap_pyfunction!(efficiency, m)?)?;
    m.add_function(wrap_pyfunction!(price_difference, m)?)?;

    Ok(())
}
