//! Stream selection

use super::entry::Catalog;
use serde_json::Value;
use std::collections::BTreeSet;

/// Ids of the streams whose root metadata carries `"selected": true`
///
/// Streams without root metadata, or with a missing or non-boolean flag, are
/// left out.
pub fn get_selected_streams(catalog: &Catalog) -> BTreeSet<String> {
    catalog
        .streams
        .iter()
        .filter(|entry| {
            entry
                .root_metadata()
                .and_then(|metadata| metadata.get("selected"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .map(|entry| entry.tap_stream_id.clone())
        .collect()
}
