//! Error taxonomy for the tap
//!
//! Errors travel as [`eyre::Report`]. The variants here are attached either as
//! the root cause or as context, so callers can classify a failure with
//! `report.downcast_ref::<TapError>()`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TapError {
    /// Invalid or contradictory configuration, detected before any remote call
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A schema definition could not be read or parsed
    #[error("Failed to load schema '{name}'")]
    SchemaLoad { name: String },

    /// A reporting or management API call failed
    #[error("Remote call failed for stream '{stream}' on {day}{}", goal_suffix(.goal))]
    RemoteCall {
        stream: String,
        day: NaiveDate,
        goal: Option<String>,
    },

    /// A flattened value does not fit any of the property's declared types
    #[error("Cannot coerce property '{property}' value {value} to {expected}")]
    Coercion {
        property: String,
        value: String,
        expected: String,
    },

    /// A report row does not line up with the stream's dimensions and metrics
    #[error("Malformed report response: {0}")]
    MalformedResponse(String),
}

fn goal_suffix(goal: &Option<String>) -> String {
    match goal {
        Some(goal) => format!(" (goal {})", goal),
        None => String::new(),
    }
}
