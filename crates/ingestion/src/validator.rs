//! Per-row quote acceptance.
//!
//! A row is rejected when its aggregator is on the exclusion list or its
//! upstream efficiency falls outside the accepted range.

use dexq_core::{lenient_f64, RawRecord, ValidationConfig};
use std::collections::HashSet;

/// Parse a percentage string such as `"99.94%"` into `99.94`.
///
/// Unparsable text yields `0.0`.
pub fn parse_efficiency(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    lenient_f64(number)
}

/// Normalize an aggregator name for exclusion matching.
#[inline]
fn normalize_aggregator(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Quote validator built from a [`ValidationConfig`].
#[derive(Debug, Clone)]
pub struct QuoteValidator {
    excluded: HashSet<String>,
    min_efficiency: f64,
    max_efficiency: f64,
}

impl QuoteValidator {
    /// Create a validator. Exclusion entries are normalized the same way as names.
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            excluded: config
                .excluded_aggregators
                .iter()
                .map(|name| normalize_aggregator(name))
                .collect(),
            min_efficiency: config.min_efficiency,
            max_efficiency: config.max_efficiency,
        }
    }

    /// Check whether a quote with this efficiency and aggregator is accepted.
    pub fn is_valid(&self, efficiency: f64, aggregator: &str) -> bool {
        if self.excluded.contains(&normalize_aggregator(aggregator)) {
            return false;
        }
        efficiency >= self.min_efficiency && efficiency <= self.max_efficiency
    }

    /// Validate a raw record, returning its parsed efficiency when accepted.
    pub fn accept(&self, record: &RawRecord) -> Option<f64> {
        let efficiency = parse_efficiency(&record.efficiency);
        self.is_valid(efficiency, &record.project).then_some(efficiency)
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}
