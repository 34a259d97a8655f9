//! Failure rendering for callers.

use dexq_core::Error;
use serde::Serialize;
use std::error::Error as _;

/// Environment variable selecting the run mode.
pub const ENV_VAR: &str = "DEXQ_ENV";

/// Whether the process runs in development mode (`DEXQ_ENV=development`).
pub fn is_development() -> bool {
    std::env::var(ENV_VAR).map_or(false, |v| v == "development")
}

/// Serializable description of a failed load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub message: String,
    /// Full diagnostic chain; only populated in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorReport {
    /// Build a report, attaching diagnostics only when `development` is set.
    pub fn new(err: &Error, development: bool) -> Self {
        let details = development.then(|| {
            let mut chain = format!("{err:?}");
            let mut cause = err.source();
            while let Some(inner) = cause {
                chain.push_str(&format!("\ncaused by: {inner}"));
                cause = inner.source();
            }
            chain
        });

        Self {
            error: "Failed to load data".to_string(),
            message: err.to_string(),
            details,
        }
    }
}
