//! Row normalization
//!
//! Converts a raw change-stream row into a canonical, order-independent
//! field mapping. Canonicalization guarantees:
//!
//! - a stable string rendering for every primitive kind
//! - exact fixed-point decimals (never routed through binary floating point)
//! - explicit nulls (a null column is rendered, not omitted)
//! - deterministic key ordering when serialized
//!
//! Normalization is a pure function of the raw row; it holds no state and
//! performs no I/O.

use std::collections::BTreeMap;

use base64::Engine;
use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};

use crate::error::{ArchiveError, Result};

/// A raw column value as delivered by the change stream, tagged with its
/// source kind. The pipeline never inspects the replication wire format;
/// the external source has already decoded values into this shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    SignedInt(i64),
    UnsignedInt(u64),
    Float(f32),
    Double(f64),
    /// Fixed-point decimal, carried as its exact textual form
    Decimal(String),
    Text(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Date {
        year: u16,
        month: u8,
        day: u8,
    },
    Time {
        hours: u8,
        minutes: u8,
        seconds: u8,
        microseconds: u32,
        negative: bool,
    },
    DateTime {
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        microsecond: u32,
    },
    /// Unix timestamp in seconds
    Timestamp(u32),
    Json(serde_json::Value),
}

/// One column of a raw row: name plus source-kind-tagged value, in whatever
/// order the source produced them.
pub type RawRow = Vec<(String, RawValue)>;

/// A normalized column value with a stable rendering and a kind name.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// Exact decimal rendering, validated but never parsed into a float
    Decimal(String),
    Text(String),
    Bool(bool),
    /// Base64 (standard alphabet) rendering of a byte blob
    Bytes(String),
}

impl CanonicalValue {
    /// Kind name used in key descriptors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Unsigned(_) => "unsigned",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Stable string rendering, used for key descriptor values.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Unsigned(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Decimal(v) => v.clone(),
            Self::Text(v) => v.clone(),
            Self::Bool(v) => v.to_string(),
            Self::Bytes(v) => v.clone(),
        }
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Unsigned(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            // Decimals serialize as strings so no consumer is tempted to
            // round them through a float
            Self::Decimal(v) => serializer.serialize_str(v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Bytes(v) => serializer.serialize_str(v),
        }
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    /// Read back a persisted value. JSON carries fewer kinds than the
    /// canonical form, so strings come back as `Text` whatever kind
    /// produced them; kind distinctions finer than JSON exist only within
    /// a run, which is all the key extractor and delta computer need.
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Unsigned(u))
                } else {
                    Ok(Self::Float(n.as_f64().unwrap_or_default()))
                }
            }
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            other => Err(D::Error::custom(format!(
                "canonical values are scalars, got {}",
                other
            ))),
        }
    }
}

/// A canonical row: column name to normalized value. `BTreeMap` gives
/// deterministic key order regardless of source ordering.
pub type CanonicalRow = BTreeMap<String, CanonicalValue>;

/// Normalize one raw row into its canonical form.
///
/// Fails with [`ArchiveError::MalformedRow`] if any value cannot be
/// normalized (non-finite float, malformed decimal text).
pub fn normalize_row(row: &RawRow) -> Result<CanonicalRow> {
    let mut out = CanonicalRow::new();
    for (name, value) in row {
        out.insert(name.clone(), normalize_value(name, value)?);
    }
    Ok(out)
}

fn normalize_value(column: &str, value: &RawValue) -> Result<CanonicalValue> {
    let canonical = match value {
        RawValue::Null => CanonicalValue::Null,
        RawValue::SignedInt(v) => CanonicalValue::Integer(*v),
        RawValue::UnsignedInt(v) => CanonicalValue::Unsigned(*v),
        RawValue::Float(v) => CanonicalValue::Float(finite(column, f64::from(*v))?),
        RawValue::Double(v) => CanonicalValue::Float(finite(column, *v)?),
        RawValue::Decimal(v) => {
            validate_decimal(column, v)?;
            CanonicalValue::Decimal(v.clone())
        }
        RawValue::Text(v) => CanonicalValue::Text(v.clone()),
        RawValue::Bool(v) => CanonicalValue::Bool(*v),
        RawValue::Bytes(v) => {
            CanonicalValue::Bytes(base64::engine::general_purpose::STANDARD.encode(v))
        }
        RawValue::Date { year, month, day } => {
            CanonicalValue::Text(format!("{:04}-{:02}-{:02}", year, month, day))
        }
        RawValue::Time {
            hours,
            minutes,
            seconds,
            microseconds,
            negative,
        } => {
            let sign = if *negative { "-" } else { "" };
            let text = if *microseconds > 0 {
                format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    sign, hours, minutes, seconds, microseconds
                )
            } else {
                format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
            };
            CanonicalValue::Text(text)
        }
        RawValue::DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
        } => {
            let text = if *microsecond > 0 {
                format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, minute, second, microsecond
                )
            } else {
                format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                )
            };
            CanonicalValue::Text(text)
        }
        RawValue::Timestamp(v) => CanonicalValue::Unsigned(u64::from(*v)),
        RawValue::Json(v) => CanonicalValue::Text(canonical_json(v)),
    };
    Ok(canonical)
}

fn finite(column: &str, v: f64) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ArchiveError::malformed_row(format!(
            "column '{}': non-finite float {}",
            column, v
        )))
    }
}

/// Validate a decimal's textual form: optional sign, digits, optional
/// fractional part. The text itself is the canonical value; it is never
/// converted to a binary float.
fn validate_decimal(column: &str, text: &str) -> Result<()> {
    let body = text.strip_prefix('-').unwrap_or(text);
    let mut parts = body.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let valid = digits(int_part) && frac_part.map_or(true, digits);
    if valid {
        Ok(())
    } else {
        Err(ArchiveError::malformed_row(format!(
            "column '{}': '{}' is not a decimal",
            column, text
        )))
    }
}

/// Render a JSON value compactly with lexicographically sorted object keys,
/// so semantically identical documents always canonicalize to the same text.
pub fn canonical_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            sorted.sort_by_key(|(k, _)| k.as_str());
            let fields: Vec<String> = sorted
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}:{}",
                        serde_json::Value::String((*k).clone()),
                        canonical_json(v)
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        serde_json::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        other => other.to_string(),
    }
}
