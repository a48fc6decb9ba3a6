//! Report response flattening
//!
//! Report rows carry their values in arrays that run parallel to the
//! requested dimensions and metrics. Flattening names each value after the
//! schema property at the same position.

use crate::error::TapError;
use crate::report::{ReportResponse, ReportRow};
use eyre::Result;
use serde_json::{Map, Value};

/// A report row keyed by schema property name
pub type FlatRecord = Map<String, Value>;

/// Lazily flatten every row of every report, in response order
///
/// Only the first metric group of a row is read. Reports without rows yield
/// nothing.
pub fn flatten<'a>(
    response: ReportResponse,
    dimensions: &'a [&'a str],
    metrics: &'a [&'a str],
) -> impl Iterator<Item = Result<FlatRecord>> + 'a {
    response
        .reports
        .into_iter()
        .flat_map(|report| report.data.rows)
        .map(move |row| flatten_row(row, dimensions, metrics))
}

fn flatten_row(row: ReportRow, dimensions: &[&str], metrics: &[&str]) -> Result<FlatRecord> {
    if row.dimensions.len() < dimensions.len() {
        return Err(TapError::MalformedResponse(format!(
            "row has {} dimension value(s), expected {}",
            row.dimensions.len(),
            dimensions.len()
        ))
        .into());
    }

    let values = row
        .metrics
        .into_iter()
        .next()
        .map(|group| group.values)
        .unwrap_or_default();
    if values.len() < metrics.len() {
        return Err(TapError::MalformedResponse(format!(
            "row has {} metric value(s), expected {}",
            values.len(),
            metrics.len()
        ))
        .into());
    }

    let mut record = FlatRecord::new();
    for (name, value) in dimensions.iter().zip(row.dimensions) {
        record.insert(name.to_string(), Value::String(value));
    }
    for (name, value) in metrics.iter().zip(values) {
        record.insert(name.to_string(), Value::String(value));
    }
    Ok(record)
}
