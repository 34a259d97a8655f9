//! Delimited text parsing.
//!
//! Turns a header-plus-rows export (tab or comma separated) into raw records.
//! Rows whose field count differs from the header are dropped.

use dexq_core::{lenient_f64, RawRecord};
use std::collections::HashMap;
use tracing::debug;

/// Pick the field delimiter from the header line: tab if present, else comma.
pub fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else {
        ','
    }
}

/// Parse delimited text into raw records.
///
/// The first line is the header. Fewer than two lines yields no records.
pub fn parse_delimited(content: &str) -> Vec<RawRecord> {
    let mut lines = content.trim().split('\n');
    let header_line = match lines.next() {
        Some(line) => line,
        None => return Vec::new(),
    };

    let delimiter = detect_delimiter(header_line);
    let headers: Vec<&str> = header_line.split(delimiter).map(str::trim).collect();

    let mut records = Vec::new();
    let mut malformed = 0usize;

    for line in lines {
        let values: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        if values.len() != headers.len() {
            malformed += 1;
            continue;
        }

        let row: HashMap<&str, &str> = headers.iter().copied().zip(values).collect();
        records.push(record_from_row(&row));
    }

    debug!(
        records = records.len(),
        malformed,
        delimiter = ?delimiter,
        "parsed delimited input"
    );
    records
}

fn record_from_row(row: &HashMap<&str, &str>) -> RawRecord {
    let text = |key: &str| row.get(key).map(|v| v.to_string()).unwrap_or_default();
    let number = |key: &str| row.get(key).map(|v| lenient_f64(v)).unwrap_or(0.0);

    let efficiency = match row.get("efficiency") {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "0%".to_string(),
    };

    RawRecord {
        timestamp: text("timestamp"),
        chain: text("chain"),
        chain_name: text("chain_name"),
        from_token: text("from_token"),
        to_token: text("to_token"),
        usd_amount: number("usd_amount"),
        token_amount: number("token_amount"),
        project: text("project"),
        expected_amount: number("expectedAmount"),
        efficiency,
        latency_ms: number("latency_ms"),
        from_amount_usd: number("from_amount_usd"),
        to_amount_usd: number("to_amount_usd"),
    }
}
