//! Singer catalog format
//!
//! The catalog is either produced by discovery or supplied by the caller with
//! `--catalog`. Example:
//! ```json
//! {
//!   "streams": [
//!     {
//!       "stream": "ga-basic-report",
//!       "tap_stream_id": "ga-basic-report",
//!       "schema": {"type": "object", "properties": {"ga:date": {"type": "string"}}},
//!       "metadata": [
//!         {"breadcrumb": [], "metadata": {"selected": true}},
//!         {"breadcrumb": ["properties", "ga:date"], "metadata": {"dimension": true}}
//!       ],
//!       "key_properties": []
//!     }
//!   ]
//! }
//! ```

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub stream: String,
    pub tap_stream_id: String,
    pub schema: Value,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default)]
    pub key_properties: Vec<String>,
}

/// Metadata attached to a stream (empty breadcrumb) or to one of its properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataEntry {
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MetadataEntry {
    /// Stream-level metadata
    pub fn root(metadata: Value) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata: into_map(metadata),
        }
    }

    /// Metadata for a single schema property
    pub fn property(name: impl Into<String>, metadata: Value) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.into()],
            metadata: into_map(metadata),
        }
    }

    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }

    pub fn is_property(&self, name: &str) -> bool {
        matches!(self.breadcrumb.as_slice(), [kind, prop] if kind == "properties" && prop == name)
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl CatalogEntry {
    /// Wrap a schema definition with empty metadata
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        Self {
            stream: name.clone(),
            tap_stream_id: name,
            schema,
            metadata: Vec::new(),
            key_properties: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = metadata;
        self
    }

    /// The stream-level metadata map, if present
    pub fn root_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|entry| entry.is_root())
            .map(|entry| &entry.metadata)
    }
}

impl Catalog {
    pub fn new(streams: Vec<CatalogEntry>) -> Self {
        Self { streams }
    }

    /// Build a catalog with one entry per schema definition, in name order
    pub fn discover(schemas: BTreeMap<String, Value>) -> Self {
        let streams = schemas
            .into_iter()
            .map(|(name, schema)| CatalogEntry::new(name, schema))
            .collect::<Vec<_>>();
        log::debug!("Discovered {} stream(s)", streams.len());
        Self { streams }
    }

    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|entry| entry.tap_stream_id == tap_stream_id)
    }

    pub fn count(&self) -> usize {
        self.streams.len()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to serialize catalog")
    }

    /// Read a catalog from a JSON file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog: {}", path.as_ref().display()))?;

        let catalog: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.as_ref().display()))?;

        Ok(catalog)
    }

    /// Write the catalog as pretty JSON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path.as_ref(), self.to_json_pretty()?)
            .with_context(|| format!("Failed to write catalog: {}", path.as_ref().display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_discover_wraps_every_schema() {
        let mut schemas = BTreeMap::new();
        schemas.insert("b-report".to_string(), json!({"properties": {}}));
        schemas.insert("a-report".to_string(), json!({"properties": {}}));

        let catalog = Catalog::discover(schemas);
        assert_eq!(catalog.count(), 2);
        assert_eq!(catalog.streams[0].tap_stream_id, "a-report");
        assert_eq!(catalog.streams[0].stream, "a-report");
        assert!(catalog.streams[0].metadata.is_empty());
        assert!(catalog.streams[0].key_properties.is_empty());
    }

    #[test]
    fn test_metadata_breadcrumbs() {
        let root = MetadataEntry::root(json!({"selected": true}));
        assert!(root.is_root());
        assert!(!root.is_property("ga:date"));

        let prop = MetadataEntry::property("ga:date", json!({"dimension": true}));
        assert!(!prop.is_root());
        assert!(prop.is_property("ga:date"));
        assert!(!prop.is_property("ga:users"));
    }

    #[test]
    fn test_parse_catalog_without_optional_fields() {
        let catalog: Catalog = serde_json::from_value(json!({
            "streams": [{
                "stream": "ga-basic-report",
                "tap_stream_id": "ga-basic-report",
                "schema": {"properties": {}}
            }]
        }))
        .unwrap();

        let entry = catalog.get("ga-basic-report").unwrap();
        assert!(entry.metadata.is_empty());
        assert!(entry.root_metadata().is_none());
    }

    #[test]
    fn test_read_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("catalog.json");

        let original = Catalog::new(vec![
            CatalogEntry::new("ga-basic-report", json!({"properties": {"ga:users": {}}}))
                .with_metadata(vec![MetadataEntry::root(json!({"selected": true}))]),
        ]);
        original.write(&path).unwrap();

        let loaded = Catalog::read(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
