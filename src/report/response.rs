//! Report and management API response types

use serde::Deserialize;

/// Body of a `reports:batchGet` response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub data: ReportData,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    /// Absent when the report has no data
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// One entry per date range
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}

impl ReportResponse {
    pub fn row_count(&self) -> usize {
        self.reports.iter().map(|r| r.data.rows.len()).sum()
    }
}

/// A goal configured on a view
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Goal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Body of a management API goals listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalList {
    #[serde(default)]
    pub items: Vec<Goal>,
}
