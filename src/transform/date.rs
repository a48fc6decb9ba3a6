//! Compact date normalization

use super::flatten::FlatRecord;
use crate::catalog::DATE_PROPERTY;
use crate::etl::Transformer;
use chrono::NaiveDate;
use eyre::Result;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Dimension the reporting API uses for the report day
pub const RAW_DATE_DIMENSION: &str = "ga:date";

static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("valid compact date pattern"));

/// Adds a canonical `date` column next to the raw `YYYYMMDD` dimension
///
/// The raw value stays in place. Values that are not a real calendar day in
/// compact form leave the record untouched.
///
/// # Example
/// ```
/// use tap_googleanalytics::transform::DateNormalizer;
/// use tap_googleanalytics::etl::Transformer;
/// use serde_json::{Map, Value, json};
///
/// let mut record = Map::new();
/// record.insert("ga:date".to_string(), json!("20230115"));
///
/// let output = DateNormalizer::new().transform(record).unwrap();
/// assert_eq!(output["date"], "2023-01-15");
/// assert_eq!(output["ga:date"], "20230115");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer;

impl DateNormalizer {
    pub fn new() -> Self {
        Self
    }
}

/// Reformat `YYYYMMDD` as `YYYY-MM-DD`
pub fn normalize_compact_date(raw: &str) -> Option<String> {
    if !COMPACT_DATE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .map(|day| day.format("%Y-%m-%d").to_string())
}

impl Transformer for DateNormalizer {
    type Input = FlatRecord;
    type Output = FlatRecord;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let normalized = input
            .get(RAW_DATE_DIMENSION)
            .and_then(Value::as_str)
            .and_then(normalize_compact_date);

        if let Some(day) = normalized {
            input.insert(DATE_PROPERTY.to_string(), Value::String(day));
        }
        Ok(input)
    }
}
