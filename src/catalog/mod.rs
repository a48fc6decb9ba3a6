//! Stream catalog
//!
//! Schema definitions, the Singer catalog format, stream selection and the
//! typed streams the sync engine works with.

mod entry;
mod schema;
mod selection;
mod stream;

pub use entry::{Catalog, CatalogEntry, MetadataEntry};
pub use schema::{
    DATE_PROPERTY, FieldKind, GOAL_ID_PROPERTY, JsonType, Property, Schema, builtin_schemas,
    load_schemas,
};
pub use selection::get_selected_streams;
pub use stream::{GOALS_REPORT, ReportKind, Stream};
