//! End-to-end transformation from raw records to cleaned trades.
//!
//! validate -> group -> outlier filter. Ids follow first-seen key order.

use dexq_core::{PipelineConfig, RawRecord, Result, Trade};
use dexq_features::{FilterOutcome, OutlierFilter};
use dexq_ingestion::{parse_delimited, QuoteValidator, TradeGrouper};
use tracing::debug;

/// Counters collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Rows offered to the pipeline.
    pub rows_in: usize,
    /// Rows dropped by validation.
    pub rows_rejected: usize,
    /// Trades produced.
    pub trades: usize,
    /// Quotes dropped by outlier filtering.
    pub quotes_removed: usize,
    /// Trades too small to filter.
    pub trades_skipped: usize,
    /// Trades where filtering rejected every quote and was undone.
    pub trades_reverted: usize,
}

/// Stateless pipeline; one instance can serve any number of runs.
#[derive(Debug, Clone)]
pub struct TradePipeline {
    config: PipelineConfig,
    validator: QuoteValidator,
    outliers: OutlierFilter,
}

impl TradePipeline {
    /// Create a pipeline from a checked configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: QuoteValidator::new(&config.validation),
            outliers: OutlierFilter::new(config.outliers.clone()),
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Transform raw records into trades.
    pub fn run(&self, records: &[RawRecord]) -> Vec<Trade> {
        self.run_with_stats(records).0
    }

    /// Parse delimited text, then transform it.
    pub fn run_text(&self, content: &str) -> Vec<Trade> {
        self.run(&parse_delimited(content))
    }

    /// Transform raw records and report what each stage did.
    pub fn run_with_stats(&self, records: &[RawRecord]) -> (Vec<Trade>, PipelineStats) {
        let mut stats = PipelineStats {
            rows_in: records.len(),
            ..PipelineStats::default()
        };

        let mut grouper = TradeGrouper::new(&self.config.grouping);
        for record in records {
            match self.validator.accept(record) {
                Some(efficiency) => grouper.add(record, efficiency),
                None => stats.rows_rejected += 1,
            }
        }

        let mut trades = grouper.finish();
        for trade in &mut trades {
            match self.outliers.apply(trade) {
                FilterOutcome::Skipped => stats.trades_skipped += 1,
                FilterOutcome::Filtered { removed } => stats.quotes_removed += removed,
                FilterOutcome::Reverted => stats.trades_reverted += 1,
            }
        }
        stats.trades = trades.len();

        debug!(?stats, "pipeline run complete");
        (trades, stats)
    }
}

impl Default for TradePipeline {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            validator: QuoteValidator::new(&config.validation),
            outliers: OutlierFilter::new(config.outliers.clone()),
            config,
        }
    }
}
