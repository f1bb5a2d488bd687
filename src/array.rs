//! Reusable binder for named database collection types.

use std::rc::Rc;

use crate::conversion;
use crate::descriptor::DescriptorCell;
use crate::driver::{Driver, DriverArray, DriverScalar, DriverStatement, TypeCode};
use crate::error::{Error, Result};
use crate::record::RecordBind;
use crate::value::Value;

/// A reusable binder for a named collection type.
///
/// Holds the collection's type name, the lazily resolved element base type,
/// and the current value sequence. Resolving the element type costs one
/// metadata round trip; the result is cached for the lifetime of the binder
/// (clones share the cache), so one instance can be bound across many calls
/// with different values.
///
/// Elements of a collection-of-records are [`Value::Tuple`]s; they are
/// encoded and decoded through a [`RecordBind`] for the element type.
#[derive(Debug, Clone)]
pub struct ArrayBind {
    type_name: String,
    element_type: Rc<DescriptorCell<String>>,
    values: Vec<Value>,
}

impl PartialEq for ArrayBind {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.values == other.values
    }
}

impl ArrayBind {
    /// Create a binder for `type_name` with an initial value sequence.
    /// The name is normalized to upper case. An OUT-only placeholder is
    /// simply a binder with no values.
    pub fn new(type_name: &str, values: Vec<Value>) -> Self {
        Self {
            type_name: type_name.to_uppercase(),
            element_type: Rc::new(DescriptorCell::new()),
            values,
        }
    }

    /// The collection type name, upper case.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current value sequence.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Replace the value sequence. The cached element type survives, which
    /// is the point of reusing one binder across calls.
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    /// Resolve and cache the element base type name. Idempotent; at most
    /// one metadata round trip per binder.
    fn resolve(&self, conn: &mut dyn Driver) -> Result<String> {
        self.element_type.resolve_with(|| {
            tracing::debug!("resolving collection type {}", self.type_name);
            conn.collection_element_type(&self.type_name)
        })
    }

    /// Encode the value sequence as a driver-native collection and bind it
    /// at `pos`. A binder with no values binds an empty collection, not
    /// NULL, so an OUT placeholder needs no special casing.
    pub fn bind_to(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<()> {
        let base_type = self.resolve(conn)?;
        let elements = self.encode_elements(conn, &base_type)?;
        stmt.set_array(
            pos,
            DriverArray {
                type_name: self.type_name.clone(),
                base_type,
                elements,
            },
        )
    }

    fn encode_elements(
        &self,
        conn: &mut dyn Driver,
        base_type: &str,
    ) -> Result<Vec<Option<DriverScalar>>> {
        match conversion::scalar_kind(base_type) {
            Some(kind) => self
                .values
                .iter()
                .map(|v| conversion::encode_scalar(kind, v))
                .collect(),
            // Outside the scalar table the elements are composites of the
            // base type; each tuple goes through the record binder.
            None => {
                let record = RecordBind::new(base_type, Vec::new());
                self.values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Tuple(attrs) => Ok(Some(DriverScalar::Struct(
                            record.to_struct(conn, attrs)?,
                        ))),
                        other => Err(Error::Encode(format!(
                            "collection {} of {} takes tuple elements, got {}",
                            self.type_name,
                            base_type,
                            other.kind_name()
                        ))),
                    })
                    .collect()
            }
        }
    }

    /// Register `pos` as an OUT parameter of this collection type.
    pub fn register_out(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<()> {
        self.resolve(conn)?;
        stmt.register_out(pos, TypeCode::Array, Some(&self.type_name))
    }

    /// Read back an OUT collection, decoded element-wise.
    ///
    /// The returned array's own base type is authoritative here, not the
    /// cached one; after a call the runtime value knows what it holds.
    pub fn retrieve_out(
        &self,
        conn: &mut dyn Driver,
        stmt: &mut dyn DriverStatement,
        pos: usize,
    ) -> Result<Vec<Value>> {
        self.resolve(conn)?;
        let array = stmt.get_array(pos)?;
        match conversion::scalar_kind(&array.base_type) {
            Some(kind) => array
                .elements
                .iter()
                .map(|e| conversion::decode_scalar(kind, e.as_ref()))
                .collect(),
            None => {
                let record = RecordBind::new(&array.base_type, Vec::new());
                array
                    .elements
                    .iter()
                    .map(|e| match e {
                        None => Ok(Value::Null),
                        Some(DriverScalar::Struct(s)) => {
                            Ok(Value::Tuple(record.from_struct(conn, s)?))
                        }
                        Some(other) => Err(Error::Decode(format!(
                            "collection of {} holds a non-composite element {:?}",
                            array.base_type, other
                        ))),
                    })
                    .collect()
            }
        }
    }
}
