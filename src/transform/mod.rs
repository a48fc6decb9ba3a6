//! Report row transformation
//!
//! Flattening turns response rows into records keyed by schema property;
//! [`DateNormalizer`] and [`SchemaCoercer`] then prepare them for emission.

mod coerce;
mod date;
mod flatten;

pub use coerce::{Record, SchemaCoercer, coerce_value};
pub use date::{DateNormalizer, RAW_DATE_DIMENSION, normalize_compact_date};
pub use flatten::{FlatRecord, flatten};
