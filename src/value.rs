//! The host-side value model.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::array::ArrayBind;
use crate::record::RecordBind;
use crate::result_set::ResultSet;

/// A host value crossing the marshaling layer in either direction.
///
/// Scalars map one-to-one onto the driver's scalar kinds. `Seq` and `Tuple`
/// are the decoded forms of collections and composites; `Array` and `Record`
/// are their bindable, descriptor-caching counterparts. `Raw` carries the
/// conventional host representation of RAW data, an upper-case hex string.
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL NULL
    Null,
    /// A DATE without a time of day
    Date(NaiveDate),
    /// A TIMESTAMP (also the decoded form of DATE columns, which carry time)
    Timestamp(NaiveDateTime),
    /// Character data
    Text(String),
    /// An INTEGER
    Int(i64),
    /// A NUMBER
    Float(f64),
    /// RAW data as a hex string
    Raw(String),
    /// A decoded collection, element-wise nullable
    Seq(Vec<Value>),
    /// A decoded composite, one value per attribute
    Tuple(Vec<Value>),
    /// A reusable collection binder
    Array(ArrayBind),
    /// A reusable composite binder
    Record(RecordBind),
    /// A decoded ref cursor
    Cursor(ResultSet),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            // Cursors have no value semantics; equal only if the same handle.
            (Value::Cursor(a), Value::Cursor(b)) => Rc::ptr_eq(a.handle(), b.handle()),
            _ => false,
        }
    }
}

impl Value {
    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short kind name used in error messages.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Raw(_) => "raw",
            Value::Seq(_) => "sequence",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Cursor(_) => "cursor",
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
