//! Message decoding: the trust boundary between raw transport bytes and
//! the typed core.
//!
//! All external input passes through [`decode`]. It either produces a
//! [`DecodedRecord`] or a [`DecodeError`]; it never panics, whatever the
//! input. Field access on the record is tolerant: numbers may arrive as
//! JSON numbers or as numeric strings, and timestamps are parsed from
//! ISO-8601 text.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Payload fields checked, in order, for the sensor discriminator.
const DISCRIMINATOR_FIELDS: &[&str] = &["sensor", "sensor_type"];

/// A decoded but not yet classified message: the parsed JSON object plus
/// the raw discriminator value that identifies the producing sensor.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    discriminator: String,
    fields: Map<String, Value>,
}

impl DecodedRecord {
    /// The raw discriminator value, as sent by the sensor node.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Look up a numeric field. Accepts JSON numbers and numeric strings.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Look up an integer field, rejecting non-integral values.
    pub fn integer(&self, field: &str) -> Option<u32> {
        let n = self.number(field)?;
        if n.fract() == 0.0 && n >= 0.0 && n <= u32::MAX as f64 {
            Some(n as u32)
        } else {
            None
        }
    }

    /// Look up a string field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.as_str()
    }

    /// Parse an ISO-8601 timestamp field into UTC.
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.text(field)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// The payload's observation timestamp, or `fallback` (normally the
    /// arrival time) when absent or unparseable.
    pub fn observed_at(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp("timestamp").unwrap_or(fallback)
    }
}

/// Decode failures. Always recovered locally by the pipeline: the message
/// is dropped, a counter is incremented, ingestion continues.
#[derive(Debug)]
pub enum DecodeError {
    /// The payload is not valid JSON, or not a JSON object.
    MalformedEncoding(String),
    /// No recognizable sensor-kind field is present.
    MissingDiscriminator,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MalformedEncoding(e) => write!(f, "malformed payload: {e}"),
            DecodeError::MissingDiscriminator => {
                write!(f, "payload has no sensor discriminator field")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Parse a raw transport payload into a [`DecodedRecord`].
pub fn decode(payload: &[u8]) -> Result<DecodedRecord, DecodeError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::MalformedEncoding(e.to_string()))?;

    let fields = match value {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::MalformedEncoding(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            )))
        }
    };

    let discriminator = DISCRIMINATOR_FIELDS
        .iter()
        .find_map(|name| fields.get(*name).and_then(Value::as_str))
        .ok_or(DecodeError::MissingDiscriminator)?
        .to_string();

    Ok(DecodedRecord {
        discriminator,
        fields,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
