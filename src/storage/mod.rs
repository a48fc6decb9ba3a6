//! Output storage
//!
//! Records leave the tap as Singer messages on an NDJSON stream.

mod singer;

pub use singer::{Message, SingerWriter, read_messages};
