//! Resolved streams

use super::entry::CatalogEntry;
use super::schema::Schema;
use eyre::Result;

pub const GOALS_REPORT: &str = "ga-goals-report";

/// Report shape, derived from the stream id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// One request per day
    Standard,
    /// Metrics are templated per goal id
    Goals,
}

impl ReportKind {
    pub fn for_stream(tap_stream_id: &str) -> Self {
        match tap_stream_id {
            GOALS_REPORT => Self::Goals,
            _ => Self::Standard,
        }
    }

    pub fn is_goals(&self) -> bool {
        matches!(self, Self::Goals)
    }
}

/// A catalog entry resolved into a typed schema
#[derive(Debug, Clone)]
pub struct Stream {
    pub tap_stream_id: String,
    pub schema: Schema,
    pub kind: ReportKind,
    pub key_properties: Vec<String>,
}

impl Stream {
    pub fn from_entry(entry: &CatalogEntry) -> Result<Self> {
        let schema = Schema::from_definition(&entry.tap_stream_id, &entry.schema, &entry.metadata)?;
        Ok(Self {
            tap_stream_id: entry.tap_stream_id.clone(),
            schema,
            kind: ReportKind::for_stream(&entry.tap_stream_id),
            key_properties: entry.key_properties.clone(),
        })
    }
}
