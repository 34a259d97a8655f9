//! Core types and configuration for the dex quote analytics pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Raw records, quotes, pairs and trades
//! - Pipeline configuration (exclusion list, chain map, buckets, thresholds)
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{GroupingConfig, OutlierConfig, PipelineConfig, ValidationConfig};
pub use error::{Error, Result};
pub use types::*;
