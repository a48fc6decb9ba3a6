//! Google Analytics Tap
//!
//! Extracts daily Google Analytics reports and emits them as Singer records

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod report;
pub mod storage;
pub mod sync;
pub mod transform;

// Re-exports for convenience
pub use catalog::{Catalog, CatalogEntry, MetadataEntry, Schema, Stream, get_selected_streams};
pub use client::{GoogleAnalyticsClient, ManagementApi, ReportingApi};
pub use config::{SyncWindow, TapConfig};
pub use error::TapError;
pub use etl::{Loader, Transformer};
pub use storage::{Message, SingerWriter};
pub use sync::{SyncContext, SyncSummary, sync};
