//! Pure conversion primitives between host scalars and driver scalars:
//! hex-encoded RAW data, date/time widening and numeric coercion, plus the
//! shared per-element codec used by the collection and composite binders.

use chrono::{NaiveDateTime, NaiveTime};

use crate::driver::DriverScalar;
use crate::error::{Error, Result};
use crate::value::Value;

/// Encode bytes as an upper-case hex string, the host-side RAW convention.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(hex_char(b >> 4));
        out.push(hex_char(b & 0x0F));
    }
    out
}

fn hex_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

/// Decode a hex string (either case) into bytes.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    let hex = hex.as_bytes();
    if hex.len() % 2 != 0 {
        return Err(Error::Encode("invalid hex length".into()));
    }
    let mut result = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        result.push((high << 4) | low);
    }
    Ok(result)
}

fn hex_digit(b: u8) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(Error::Encode(format!("invalid hex digit: {}", b as char))),
    }
}

/// Widen a host date or timestamp to the driver's datetime representation.
/// An Oracle DATE carries a time of day, so a plain date becomes midnight.
pub fn value_to_datetime(v: &Value) -> Result<Option<NaiveDateTime>> {
    match v {
        Value::Null => Ok(None),
        Value::Date(d) => Ok(Some(d.and_time(NaiveTime::MIN))),
        Value::Timestamp(dt) => Ok(Some(*dt)),
        other => Err(Error::Encode(format!(
            "cannot encode {} as a date, use a date or timestamp value",
            other.kind_name()
        ))),
    }
}

/// Coerce a host numeric to the driver's NUMBER representation.
pub fn value_to_number(v: &Value) -> Result<Option<f64>> {
    match v {
        Value::Null => Ok(None),
        Value::Int(i) => Ok(Some(*i as f64)),
        Value::Float(f) => Ok(Some(*f)),
        other => Err(Error::Encode(format!(
            "cannot encode {} as a number",
            other.kind_name()
        ))),
    }
}

/// Extract the host hex string for a RAW bind. Plain text is accepted so a
/// typed RAW slot can carry an ordinary string value.
pub fn value_to_raw_bytes(v: &Value) -> Result<Option<Vec<u8>>> {
    match v {
        Value::Null => Ok(None),
        Value::Raw(hex) | Value::Text(hex) => hex_to_bytes(hex).map(Some),
        other => Err(Error::Encode(format!(
            "cannot encode {} as raw, use a hex string",
            other.kind_name()
        ))),
    }
}

/// The scalar kinds an element or attribute base type name can resolve to.
///
/// Both the collection and the composite binder dispatch element-wise through
/// this one table; a base type outside it is either a nested composite (for
/// collections) or an error (for composites).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// VARCHAR / CHAR
    Text,
    /// RAW
    Raw,
    /// NUMBER / INTEGER
    Number,
    /// DATE / TIMESTAMP
    DateTime,
}

/// Map a driver-reported base type name onto its scalar kind, or `None` for
/// anything outside the scalar table.
pub fn scalar_kind(base_type: &str) -> Option<ScalarKind> {
    match base_type {
        "VARCHAR" | "VARCHAR2" | "CHAR" => Some(ScalarKind::Text),
        "RAW" => Some(ScalarKind::Raw),
        "NUMBER" | "INTEGER" => Some(ScalarKind::Number),
        "DATE" | "TIMESTAMP" => Some(ScalarKind::DateTime),
        _ => None,
    }
}

/// Encode one element/attribute value for its resolved scalar kind.
pub fn encode_scalar(kind: ScalarKind, v: &Value) -> Result<Option<DriverScalar>> {
    match kind {
        ScalarKind::Text => match v {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(DriverScalar::Varchar(s.clone()))),
            other => Err(Error::Encode(format!(
                "cannot encode {} as a string element",
                other.kind_name()
            ))),
        },
        ScalarKind::Raw => Ok(value_to_raw_bytes(v)?.map(DriverScalar::Raw)),
        ScalarKind::Number => Ok(value_to_number(v)?.map(DriverScalar::Number)),
        ScalarKind::DateTime => Ok(value_to_datetime(v)?.map(DriverScalar::DateTime)),
    }
}

/// Decode one element/attribute value for its scalar kind. Numeric elements
/// always decode as floats, mirroring the driver's NUMBER representation.
pub fn decode_scalar(kind: ScalarKind, v: Option<&DriverScalar>) -> Result<Value> {
    let Some(v) = v else {
        return Ok(Value::Null);
    };
    match (kind, v) {
        (ScalarKind::Text, DriverScalar::Varchar(s)) => Ok(Value::Text(s.clone())),
        (ScalarKind::Raw, DriverScalar::Raw(bytes)) => Ok(Value::Raw(bytes_to_hex(bytes))),
        (ScalarKind::Number, DriverScalar::Number(n)) => Ok(Value::Float(*n)),
        (ScalarKind::DateTime, DriverScalar::DateTime(dt)) => Ok(Value::Timestamp(*dt)),
        (kind, other) => Err(Error::Decode(format!(
            "driver value {:?} does not match element kind {:?}",
            other, kind
        ))),
    }
}
