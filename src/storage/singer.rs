//! Singer message output
//!
//! Messages are written as NDJSON, one message per line, flushed as soon as
//! they are written so downstream targets see records immediately.

use crate::catalog::Stream;
use crate::etl::Loader;
use crate::transform::Record;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Describes the records that follow for a stream
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    /// One validated record
    Record { stream: String, record: Record },
}

impl Message {
    pub fn schema(stream: &Stream) -> Self {
        Self::Schema {
            stream: stream.tap_stream_id.clone(),
            schema: stream.schema.definition().clone(),
            key_properties: stream.key_properties.clone(),
        }
    }

    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    pub fn stream(&self) -> &str {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => stream,
        }
    }
}

/// Writes Singer messages to any `io::Write`, usually stdout
pub struct SingerWriter<W: Write> {
    out: W,
    written: usize,
}

impl SingerWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> SingerWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Write a single message followed by a newline
    pub fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)
            .with_context(|| format!("Failed to serialize message for stream {}", message.stream()))?;
        self.out.write_all(b"\n")?;
        self.out.flush().with_context(|| "Failed to flush output")?;
        self.written += 1;
        Ok(())
    }

    /// Number of messages written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Loader for SingerWriter<W> {
    type Item = Message;

    fn load(&mut self, item: Self::Item) -> Result<()> {
        self.write(&item)
    }
}

/// Parse NDJSON output back into messages
pub fn read_messages(content: &str) -> Result<Vec<Message>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).with_context(|| format!("Failed to parse message: {}", line))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_format() {
        let mut writer = SingerWriter::new(Vec::new());
        let record: Record = serde_json::from_value(json!({"ga:sessions": 42})).unwrap();
        writer
            .load(Message::record("ga-basic-report", record))
            .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.ends_with('\n'));
        let line: Value = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(
            line,
            json!({"type": "RECORD", "stream": "ga-basic-report", "record": {"ga:sessions": 42}})
        );
    }

    #[test]
    fn test_schema_wire_format() {
        let message = Message::Schema {
            stream: "ga-basic-report".to_string(),
            schema: json!({"properties": {}}),
            key_properties: vec![],
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "SCHEMA");
        assert_eq!(value["key_properties"], json!([]));
    }

    #[test]
    fn test_read_back() {
        let mut writer = SingerWriter::new(Vec::new());
        writer
            .write(&Message::record("a", Record::new()))
            .unwrap();
        writer
            .write(&Message::record("b", Record::new()))
            .unwrap();
        assert_eq!(writer.written(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let messages = read_messages(&output).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].stream(), "b");
    }
}
