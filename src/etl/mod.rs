//! Core transform and load abstractions
//!
//! Report rows are extracted by the API clients, transformed into records and
//! loaded into the output stream.

mod load;
mod transform;

pub use load::Loader;
pub use transform::{Chain, Transformer};
