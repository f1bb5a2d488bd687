//! Bind-slot and column-value dispatch.
//!
//! Encoding dispatches on a closed set of bind kinds, so the unsupported
//! arm is reachable only through the explicit [`BindType::Unsupported`] tag.
//! Decoding is purely data-driven by the column type name the driver
//! reports, independent of what the caller expected.

use crate::array::ArrayBind;
use crate::conversion;
use crate::driver::{Driver, DriverStatement, ScalarGet, TypeCode};
use crate::error::{Error, Result};
use crate::record::RecordBind;
use crate::result_set::ResultSet;
use crate::value::Value;

/// The declared type of a bind slot.
///
/// Collection and composite slots carry their reusable binder here: the
/// binder instance, not a static table entry, knows the database type and
/// its cached descriptor.
#[derive(Debug, Clone)]
pub enum BindType {
    /// DATE
    Date,
    /// TIMESTAMP
    Timestamp,
    /// VARCHAR2
    Varchar,
    /// INTEGER
    Integer,
    /// NUMBER
    Number,
    /// RAW, host value is a hex string
    Raw,
    /// REF CURSOR; retrieval only, binding a non-null cursor is unsupported
    RefCursor,
    /// A named collection type
    Array(ArrayBind),
    /// A named composite type
    Record(RecordBind),
    /// Explicitly unsupported; binding fails with `UnknownBindType`
    Unsupported(String),
}

/// One positional parameter of a call or statement.
#[derive(Debug, Clone)]
pub enum BindSlot {
    /// Input parameter, type inferred from the value's own kind
    In(Value),
    /// Input parameter with an explicit type; the value may be `Null`
    InTyped(BindType, Value),
    /// Output-only parameter
    Out(BindType),
    /// Parameter that is both input and output
    InOut(BindType, Value),
}

impl BindSlot {
    /// True for `Out` and `InOut` slots.
    pub fn is_out(&self) -> bool {
        matches!(self, BindSlot::Out(_) | BindSlot::InOut(_, _))
    }
}

/// Infer the bind type from a bare input value. A bare NULL is ambiguous
/// and rejected; use `InTyped` to bind a typed NULL.
pub fn infer_bind_type(value: &Value) -> Result<BindType> {
    match value {
        Value::Date(_) => Ok(BindType::Date),
        Value::Timestamp(_) => Ok(BindType::Timestamp),
        Value::Text(_) => Ok(BindType::Varchar),
        Value::Int(_) => Ok(BindType::Integer),
        Value::Float(_) => Ok(BindType::Number),
        Value::Raw(_) => Ok(BindType::Raw),
        Value::Array(a) => Ok(BindType::Array(a.clone())),
        Value::Record(r) => Ok(BindType::Record(r.clone())),
        Value::Cursor(_) => Ok(BindType::RefCursor),
        other => Err(Error::UnknownBindType(other.kind_name().to_string())),
    }
}

fn type_code(ty: &BindType) -> TypeCode {
    match ty {
        BindType::Date => TypeCode::Date,
        BindType::Timestamp => TypeCode::Timestamp,
        BindType::Varchar => TypeCode::Varchar,
        BindType::Integer => TypeCode::Integer,
        BindType::Number => TypeCode::Number,
        BindType::Raw => TypeCode::Raw,
        BindType::RefCursor => TypeCode::Cursor,
        BindType::Array(_) => TypeCode::Array,
        BindType::Record(_) => TypeCode::Struct,
        BindType::Unsupported(_) => TypeCode::Varchar,
    }
}

/// Encode one slot into the statement at a 1-based position, registering
/// output parameters first where the slot calls for it.
pub fn bind_slot(
    conn: &mut dyn Driver,
    stmt: &mut dyn DriverStatement,
    slot: &BindSlot,
    pos: usize,
) -> Result<()> {
    match slot {
        BindSlot::In(value) => {
            let ty = infer_bind_type(value)?;
            bind_in(conn, stmt, &ty, value, pos)
        }
        BindSlot::InTyped(ty, value) => bind_in(conn, stmt, ty, value, pos),
        BindSlot::Out(ty) => {
            register_out(conn, stmt, ty, pos)?;
            bind_in(conn, stmt, ty, &Value::Null, pos)
        }
        BindSlot::InOut(ty, value) => {
            register_out(conn, stmt, ty, pos)?;
            bind_in(conn, stmt, ty, value, pos)
        }
    }
}

/// Register a slot as an output parameter of its mapped driver type.
/// Collections and composites register through their own descriptor.
fn register_out(
    conn: &mut dyn Driver,
    stmt: &mut dyn DriverStatement,
    ty: &BindType,
    pos: usize,
) -> Result<()> {
    match ty {
        BindType::Array(a) => a.register_out(conn, stmt, pos),
        BindType::Record(r) => r.register_out(conn, stmt, pos),
        BindType::Unsupported(name) => Err(Error::UnknownBindType(name.clone())),
        scalar => stmt.register_out(pos, type_code(scalar), None),
    }
}

/// Encode the input side of a slot. A NULL scalar encodes as an explicit
/// typed SQL NULL, never as a no-op.
fn bind_in(
    conn: &mut dyn Driver,
    stmt: &mut dyn DriverStatement,
    ty: &BindType,
    value: &Value,
    pos: usize,
) -> Result<()> {
    match ty {
        BindType::Date => match conversion::value_to_datetime(value)? {
            Some(dt) => stmt.set_date(pos, dt),
            None => stmt.set_null(pos, TypeCode::Date),
        },
        BindType::Timestamp => match conversion::value_to_datetime(value)? {
            Some(dt) => stmt.set_timestamp(pos, dt),
            None => stmt.set_null(pos, TypeCode::Timestamp),
        },
        BindType::Varchar => match value {
            Value::Null => stmt.set_null(pos, TypeCode::Varchar),
            Value::Text(s) => stmt.set_string(pos, s),
            other => Err(Error::Encode(format!(
                "cannot bind {} as a string",
                other.kind_name()
            ))),
        },
        BindType::Integer => match value {
            Value::Null => stmt.set_null(pos, TypeCode::Integer),
            Value::Int(i) => stmt.set_int(pos, *i),
            other => Err(Error::Encode(format!(
                "cannot bind {} as an integer",
                other.kind_name()
            ))),
        },
        BindType::Number => match conversion::value_to_number(value)? {
            Some(n) => stmt.set_number(pos, n),
            None => stmt.set_null(pos, TypeCode::Number),
        },
        BindType::Raw => match conversion::value_to_raw_bytes(value)? {
            Some(bytes) => stmt.set_raw(pos, &bytes),
            None => stmt.set_null(pos, TypeCode::Raw),
        },
        BindType::RefCursor => match value {
            // A cursor can only be retrieved, never sent.
            Value::Null => Ok(()),
            _ => Err(Error::Unsupported("binding a ref cursor".into())),
        },
        // The binder's own value sequence is bound; the slot value is only
        // a placeholder for collection and composite slots.
        BindType::Array(a) => a.bind_to(conn, stmt, pos),
        BindType::Record(r) => r.bind_to(conn, stmt, pos),
        BindType::Unsupported(name) => Err(Error::UnknownBindType(name.clone())),
    }
}

/// Decode an output slot after execution, based on the slot's declared type.
pub fn retrieve_typed(
    conn: &mut dyn Driver,
    stmt: &mut dyn DriverStatement,
    ty: &BindType,
    pos: usize,
) -> Result<Value> {
    match ty {
        BindType::Date => Ok(stmt
            .get_timestamp(pos)?
            .map_or(Value::Null, |dt| Value::Date(dt.date()))),
        BindType::Timestamp => Ok(stmt
            .get_timestamp(pos)?
            .map_or(Value::Null, Value::Timestamp)),
        BindType::Varchar => Ok(stmt.get_string(pos)?.map_or(Value::Null, Value::Text)),
        BindType::Integer => retrieve_int(stmt, pos),
        BindType::Number => Ok(stmt.get_number(pos)?.map_or(Value::Null, Value::Float)),
        BindType::Raw => Ok(stmt
            .get_raw(pos)?
            .map_or(Value::Null, |bytes| Value::Raw(conversion::bytes_to_hex(&bytes)))),
        BindType::RefCursor => {
            let rows = stmt.get_cursor(pos)?;
            Ok(Value::Cursor(ResultSet::new(rows)))
        }
        BindType::Array(a) => Ok(Value::Seq(a.retrieve_out(conn, stmt, pos)?)),
        BindType::Record(r) => Ok(Value::Tuple(r.retrieve_out(conn, stmt, pos)?)),
        BindType::Unsupported(name) => Err(Error::UnknownBindType(name.clone())),
    }
}

/// Decode a column value, dispatching on the driver-reported type name.
pub fn retrieve_value<S: ScalarGet + ?Sized>(
    src: &mut S,
    type_name: &str,
    pos: usize,
) -> Result<Value> {
    match type_name {
        "NUMBER" => Ok(src.get_number(pos)?.map_or(Value::Null, Value::Float)),
        "INTEGER" => retrieve_int(src, pos),
        "DATE" | "TIMESTAMP" => Ok(src
            .get_timestamp(pos)?
            .map_or(Value::Null, Value::Timestamp)),
        "CHAR" | "VARCHAR" | "VARCHAR2" | "CLOB" => {
            Ok(src.get_string(pos)?.map_or(Value::Null, Value::Text))
        }
        "RAW" => Ok(src
            .get_raw(pos)?
            .map_or(Value::Null, |bytes| Value::Raw(conversion::bytes_to_hex(&bytes)))),
        other => Err(Error::UnknownSqlType(other.to_string())),
    }
}

/// An integer slot decodes to 0 for NULL, so the was-null flag is the only
/// authority on whether the value was NULL.
fn retrieve_int<S: ScalarGet + ?Sized>(src: &mut S, pos: usize) -> Result<Value> {
    let v = src.get_int(pos)?;
    if src.was_null() {
        Ok(Value::Null)
    } else {
        Ok(Value::Int(v))
    }
}
