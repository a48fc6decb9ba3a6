//! Reporting API payloads

mod request;
mod response;

pub use request::{DateRange, Dimension, GOAL_PLACEHOLDER, Metric, ReportRequest, build_request};
pub use response::{DateRangeValues, Goal, GoalList, Report, ReportData, ReportResponse, ReportRow};
