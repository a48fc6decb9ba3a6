//! Report request construction
//!
//! One request covers exactly one day. Wide date ranges risk running into the
//! API's row cap, so the sync engine asks day by day instead.

use chrono::NaiveDate;
use serde::Serialize;

/// Token in goal metric names that is replaced by the goal id
pub const GOAL_PLACEHOLDER: &str = "XX";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<Metric>,
    pub dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_empty_rows: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
}

impl ReportRequest {
    /// The single day this request covers
    pub fn day(&self) -> Option<NaiveDate> {
        self.date_ranges.first().map(|range| range.start_date)
    }
}

/// Build the request for one stream on one day
///
/// With a goal id, the first [`GOAL_PLACEHOLDER`] in each metric name is
/// replaced by it. Empty rows are only requested for non-goal reports, so
/// those always produce one row per day.
pub fn build_request(
    view_id: &str,
    day: NaiveDate,
    metrics: &[&str],
    dimensions: &[&str],
    goal_id: Option<&str>,
) -> ReportRequest {
    let metrics = metrics
        .iter()
        .map(|name| Metric {
            expression: match goal_id {
                Some(goal_id) => name.replacen(GOAL_PLACEHOLDER, goal_id, 1),
                None => name.to_string(),
            },
        })
        .collect();

    let dimensions = dimensions
        .iter()
        .map(|name| Dimension {
            name: name.to_string(),
        })
        .collect();

    ReportRequest {
        view_id: view_id.to_string(),
        date_ranges: vec![DateRange {
            start_date: day,
            end_date: day,
        }],
        metrics,
        dimensions,
        include_empty_rows: goal_id.is_none(),
    }
}
