//! Schema-driven type coercion
//!
//! The reporting API returns every value as a string. Each declared property
//! is converted to the first of its declared JSON types that accepts the
//! value; properties the schema does not declare are dropped.

use super::flatten::FlatRecord;
use crate::catalog::{JsonType, Property, Schema};
use crate::error::TapError;
use crate::etl::Transformer;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use eyre::Result;
use serde_json::{Map, Number, Value};

/// A validated record, ready to emit
pub type Record = Map<String, Value>;

/// Coerces flattened records to the types declared by a stream schema
#[derive(Debug, Clone, Copy)]
pub struct SchemaCoercer<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaCoercer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }
}

impl Transformer for SchemaCoercer<'_> {
    type Input = FlatRecord;
    type Output = Record;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let mut record = Record::new();
        for (name, value) in input {
            let Some(property) = self.schema.property(&name) else {
                log::trace!(
                    "Dropping '{}', not declared by schema {}",
                    name,
                    self.schema.name()
                );
                continue;
            };
            let coerced = coerce_value(property, value)?;
            record.insert(name, coerced);
        }
        Ok(record)
    }
}

/// Convert a value to the first declared type that accepts it
pub fn coerce_value(property: &Property, value: Value) -> Result<Value> {
    if property.types.is_empty() {
        return Ok(value);
    }

    for json_type in &property.types {
        if let Some(coerced) = coerce_to(*json_type, property.format.as_deref(), &value) {
            return Ok(coerced);
        }
    }

    let expected = property
        .types
        .iter()
        .map(JsonType::as_str)
        .collect::<Vec<_>>()
        .join(" | ");
    Err(TapError::Coercion {
        property: property.name.clone(),
        value: value.to_string(),
        expected,
    }
    .into())
}

fn coerce_to(json_type: JsonType, format: Option<&str>, value: &Value) -> Option<Value> {
    match (json_type, value) {
        (JsonType::Null, Value::Null) => Some(Value::Null),
        (JsonType::Null, _) => None,

        (JsonType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
        (JsonType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (JsonType::Number, Value::Number(_)) => Some(value.clone()),
        (JsonType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        (JsonType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (JsonType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        (JsonType::String, Value::String(s)) if format == Some("date-time") => {
            parse_date_time(s).map(Value::String)
        }
        (JsonType::String, Value::String(_)) => Some(value.clone()),
        (JsonType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (JsonType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (JsonType::Object, Value::Object(_)) => Some(value.clone()),
        (JsonType::Array, Value::Array(_)) => Some(value.clone()),

        _ => None,
    }
}

/// Normalize a timestamp or day to RFC 3339 in UTC
fn parse_date_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let timestamp = DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|t| t.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc())
        })?;
    Some(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_definition(
            "test",
            &json!({"properties": {
                "ga:date": {"type": ["null", "string"]},
                "date": {"type": ["null", "string"]},
                "ga:sessions": {"type": ["null", "integer"]},
                "ga:bounceRate": {"type": ["null", "number"]},
                "ga:isMobile": {"type": ["null", "boolean"]},
                "ga:dateHourMinute": {"type": ["null", "string"], "format": "date-time"},
                "ga:anything": {}
            }}),
            &[],
        )
        .unwrap()
    }

    fn flat(value: Value) -> FlatRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coerces_declared_types() {
        let schema = schema();
        let output = SchemaCoercer::new(&schema)
            .transform(flat(json!({
                "ga:date": "20230115",
                "date": "2023-01-15",
                "ga:sessions": "42",
                "ga:bounceRate": "12.5",
                "ga:isMobile": "TRUE",
                "ga:anything": "kept"
            })))
            .unwrap();

        assert_eq!(
            Value::Object(output),
            json!({
                "ga:date": "20230115",
                "date": "2023-01-15",
                "ga:sessions": 42,
                "ga:bounceRate": 12.5,
                "ga:isMobile": true,
                "ga:anything": "kept"
            })
        );
    }

    #[test]
    fn test_undeclared_properties_dropped() {
        let schema = schema();
        let output = SchemaCoercer::new(&schema)
            .transform(flat(json!({"ga:sessions": "1", "ga:unknown": "x"})))
            .unwrap();
        assert!(!output.contains_key("ga:unknown"));
        assert_eq!(output["ga:sessions"], 1);
    }

    #[test]
    fn test_null_is_accepted_first() {
        let schema = schema();
        let output = SchemaCoercer::new(&schema)
            .transform(flat(json!({"ga:sessions": null})))
            .unwrap();
        assert_eq!(output["ga:sessions"], Value::Null);
    }

    #[test]
    fn test_uncoercible_value_fails() {
        let schema = schema();
        let err = SchemaCoercer::new(&schema)
            .transform(flat(json!({"ga:sessions": "12.5"})))
            .unwrap_err();

        match err.downcast_ref::<TapError>() {
            Some(TapError::Coercion {
                property,
                value,
                expected,
            }) => {
                assert_eq!(property, "ga:sessions");
                assert_eq!(value, "\"12.5\"");
                assert_eq!(expected, "null | integer");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_date_time_format() {
        let schema = schema();
        let output = SchemaCoercer::new(&schema)
            .transform(flat(json!({"ga:dateHourMinute": "2023-01-15"})))
            .unwrap();
        assert_eq!(output["ga:dateHourMinute"], "2023-01-15T00:00:00.000000Z");

        let err = SchemaCoercer::new(&schema)
            .transform(flat(json!({"ga:dateHourMinute": "not a date"})))
            .unwrap_err();
        assert!(err.to_string().contains("ga:dateHourMinute"));
    }

    #[test]
    fn test_number_rejects_non_finite() {
        let property = Property {
            name: "ga:rate".to_string(),
            types: vec![JsonType::Number],
            format: None,
            kind: crate::catalog::FieldKind::Metric,
        };
        assert!(coerce_value(&property, json!("NaN")).is_err());
        assert_eq!(coerce_value(&property, json!("3")).unwrap(), json!(3.0));
    }
}
