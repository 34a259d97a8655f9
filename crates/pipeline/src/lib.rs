//! Pipeline orchestration for the dex quote analytics system.
//!
//! This crate provides:
//! - The end-to-end raw record to trade transformation
//! - Input source discovery and loading (csv, raw json, legacy trades)
//! - Failure reports for callers

pub mod pipeline;
pub mod source;
pub mod diagnostics;

pub use pipeline::{PipelineStats, TradePipeline};
pub use source::{load_dataset, load_trades, DataSource, Dataset};
pub use diagnostics::ErrorReport;
