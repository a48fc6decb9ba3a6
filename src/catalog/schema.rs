//! Typed stream schemas
//!
//! A schema definition is a JSON Schema object. When it is resolved against the
//! catalog metadata, every property is tagged once as a dimension or a metric.

use super::entry::MetadataEntry;
use crate::error::TapError;
use eyre::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Derived output column, never requested from the API
pub const DATE_PROPERTY: &str = "date";

/// Derived column carrying the goal a goal-report record belongs to
pub const GOAL_ID_PROPERTY: &str = "goal_id";

/// Columns the tap fills in itself; never requested from the API
const DERIVED_PROPERTIES: [&str; 2] = [DATE_PROPERTY, GOAL_ID_PROPERTY];

/// Schemas shipped with the tap
const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    (
        "ga-adwords-report",
        include_str!("../../schemas/ga-adwords-report.json"),
    ),
    (
        "ga-basic-report",
        include_str!("../../schemas/ga-basic-report.json"),
    ),
    (
        "ga-goals-report",
        include_str!("../../schemas/ga-goals-report.json"),
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Grouping key, sent as a report dimension
    Dimension,
    /// Measured value, sent as a report metric
    Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Object,
    Array,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Declared types, in the order they should be attempted
    pub types: Vec<JsonType>,
    pub format: Option<String>,
    pub kind: FieldKind,
}

impl Property {
    pub fn is_dimension(&self) -> bool {
        self.kind == FieldKind::Dimension
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    properties: Vec<Property>,
    definition: Value,
}

impl Schema {
    /// Resolve a schema definition against its catalog metadata
    ///
    /// A property is a dimension iff the metadata entry with breadcrumb
    /// `["properties", <name>]` carries `"dimension": true`.
    pub fn from_definition(
        name: impl Into<String>,
        definition: &Value,
        metadata: &[MetadataEntry],
    ) -> Result<Self> {
        let name = name.into();
        let declared = declared_properties(definition).ok_or_else(|| {
            eyre::Report::new(TapError::SchemaLoad { name: name.clone() })
                .wrap_err("Schema definition must be an object with a 'properties' object")
        })?;

        let properties = declared
            .iter()
            .map(|(prop, definition)| {
                let dimension = metadata
                    .iter()
                    .find(|entry| entry.is_property(prop))
                    .and_then(|entry| entry.metadata.get("dimension"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                Property {
                    name: prop.clone(),
                    types: property_types(definition),
                    format: definition.get("format").and_then(Value::as_str).map(String::from),
                    kind: if dimension {
                        FieldKind::Dimension
                    } else {
                        FieldKind::Metric
                    },
                }
            })
            .collect();

        Ok(Self {
            name,
            properties,
            definition: definition.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The raw JSON Schema this was built from
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// Dimension names in declaration order
    pub fn dimensions(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.is_dimension())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Metric names in declaration order, without the derived columns
    pub fn metrics(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| !p.is_dimension() && !DERIVED_PROPERTIES.contains(&p.name.as_str()))
            .map(|p| p.name.as_str())
            .collect()
    }
}

fn declared_properties(definition: &Value) -> Option<&Map<String, Value>> {
    definition.as_object()?.get("properties")?.as_object()
}

fn property_types(definition: &Value) -> Vec<JsonType> {
    match definition.get("type") {
        Some(Value::String(name)) => JsonType::parse(name).into_iter().collect(),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .filter_map(JsonType::parse)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse one schema definition, checking its basic shape
fn parse_definition(name: &str, content: &str) -> Result<Value> {
    let definition: Value = serde_json::from_str(content).with_context(|| TapError::SchemaLoad {
        name: name.to_string(),
    })?;
    if declared_properties(&definition).is_none() {
        return Err(eyre::Report::new(TapError::SchemaLoad {
            name: name.to_string(),
        })
        .wrap_err(format!("Schema '{}' has no 'properties' object", name)));
    }
    Ok(definition)
}

/// Schema definitions embedded in the binary, keyed by stream name
pub fn builtin_schemas() -> Result<BTreeMap<String, Value>> {
    BUILTIN_SCHEMAS
        .iter()
        .map(|(name, content)| Ok((name.to_string(), parse_definition(name, content)?)))
        .collect()
}

/// Load every `*.json` schema in a directory, keyed by file base name
pub fn load_schemas(dir: impl AsRef<Path>) -> Result<BTreeMap<String, Value>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read schema directory: {}", dir.display()))?;

    let mut schemas = BTreeMap::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let content = std::fs::read_to_string(&path).with_context(|| TapError::SchemaLoad {
            name: name.to_string(),
        })?;
        log::debug!("Loaded schema {} from {}", name, path.display());
        schemas.insert(name.to_string(), parse_definition(name, &content)?);
    }

    Ok(schemas)
}
