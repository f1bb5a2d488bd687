//! Reusable binder for named database composite (object) types.

use std::rc::Rc;

use crate::conversion;
use crate::descriptor::DescriptorCell;
use crate::driver::{Driver, DriverStatement, DriverStruct, TypeCode};
use crate::error::{Error, Result};
use crate::value::Value;

/// A reusable binder for a named composite type.
///
/// Holds the composite's type name, the lazily resolved ordered attribute
/// base type list (whose length is the type's arity), and the current value
/// tuple. The attribute list is resolved once per binder and shared by
/// clones, the same caching discipline as [`crate::ArrayBind`].
#[derive(Debug, Clone)]
pub struct RecordBind {
    type_name: String,
    attribute_types: Rc<DescriptorCell<Vec<String>>>,
    values: Vec<Value>,
}

impl PartialEq for RecordBind {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.values == other.values
    }
}

impl RecordBind {
    /// Create a binder for `type_name` with an initial value tuple. The
    /// name is normalized to upper case. A binder with no values acts as a
    /// reusable OUT placeholder.
    pub fn new(type_name: &str, values: Vec<Value>) -> Self {
        Self {
            type_name: type_name.to_uppercase(),
            attribute_types: Rc::new(DescriptorCell::new()),
            values,
        }
    }

    /// The composite type name, upper case.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current value tuple.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Replace the value tuple without touching the cached attribute list.
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    /// Resolve and cache the ordered attribute base type list. Idempotent;
    /// at most one metadata round trip per binder.
    fn resolve(&self, conn: &mut dyn Driver) -> Result<Vec<String>> {
        self.attribute_types.resolve_with(|| {
            tracing::debug!("resolving composite type {}", self.type_name);
            conn.composite_attribute_types(&self.type_name)
        })
    }

    /// Encode an explicit value tuple as a driver-native composite.
    ///
    /// The tuple length must equal the type's arity. Attributes encode
    /// through the shared scalar table; composites within composites are
    /// not supported and fail with `UnknownSqlType`.
    pub fn to_struct(&self, conn: &mut dyn Driver, input: &[Value]) -> Result<DriverStruct> {
        let attr_types = self.resolve(conn)?;
        if attr_types.len() != input.len() {
            return Err(Error::ArityMismatch {
                type_name: self.type_name.clone(),
                expected: attr_types.len(),
                provided: input.len(),
            });
        }
        let attributes = attr_types
            .iter()
            .zip(input)
            .map(|(attr_type, v)| {
                let kind = conversion::scalar_kind(attr_type)
                    .ok_or_else(|| Error::UnknownSqlType(attr_type.clone()))?;
                conversion::encode_scalar(kind, v)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DriverStruct {
            type_name: self.type_name.clone(),
            attributes,
        })
    }

    /// Encode the held value tuple and bind it at `pos`. An empty tuple
    /// binds nothing, so an OUT placeholder costs no extra round trip.
    pub fn bind_to(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<()> {
        self.resolve(conn)?;
        if self.values.is_empty() {
            return Ok(());
        }
        let s = self.to_struct(conn, &self.values)?;
        stmt.set_struct(pos, s)
    }

    /// Register `pos` as an OUT parameter of this composite type.
    pub fn register_out(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<()> {
        self.resolve(conn)?;
        stmt.register_out(pos, TypeCode::Struct, Some(&self.type_name))
    }

    /// Read back an OUT composite as an ordered value tuple.
    pub fn retrieve_out(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<Vec<Value>> {
        self.resolve(conn)?;
        let s = stmt.get_struct(pos)?;
        self.from_struct(conn, &s)
    }

    /// Decode a driver-native composite into an ordered value tuple, one
    /// independently nullable value per attribute.
    pub fn from_struct(&self, conn: &mut dyn Driver, s: &DriverStruct) -> Result<Vec<Value>> {
        let attr_types = self.resolve(conn)?;
        attr_types
            .iter()
            .enumerate()
            .map(|(i, attr_type)| {
                let kind = conversion::scalar_kind(attr_type)
                    .ok_or_else(|| Error::UnknownSqlType(attr_type.clone()))?;
                let attr = s.attributes.get(i).and_then(|a| a.as_ref());
                conversion::decode_scalar(kind, attr)
            })
            .collect()
    }
}
