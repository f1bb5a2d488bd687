//! The driver seam: traits describing what the underlying connection must
//! provide, and the driver-native values that cross it.
//!
//! Everything in this crate marshals through these traits. The crate never
//! owns the connection, never commits or rolls back, and never opens or
//! registers anything; it only prepares, binds, executes and fetches.
//! [`crate::mock::MockDriver`] is an in-memory implementation for tests.

use chrono::NaiveDateTime;

use crate::error::Result;

/// Driver type codes used for typed NULLs and output-parameter registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
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
    /// RAW
    Raw,
    /// REF CURSOR
    Cursor,
    /// Named collection type
    Array,
    /// Named composite (object) type
    Struct,
}

/// A driver-native scalar, as stored inside collections and composites.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverScalar {
    /// Character data
    Varchar(String),
    /// NUMBER / INTEGER payload
    Number(f64),
    /// DATE / TIMESTAMP payload (an Oracle DATE carries a time of day)
    DateTime(NaiveDateTime),
    /// RAW bytes
    Raw(Vec<u8>),
    /// A nested composite value (collection-of-records)
    Struct(DriverStruct),
}

/// A driver-native collection value.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverArray {
    /// Collection type name, upper case
    pub type_name: String,
    /// Element base type name as reported by the driver, e.g. `VARCHAR`
    pub base_type: String,
    /// Elements in order, independently nullable
    pub elements: Vec<Option<DriverScalar>>,
}

/// A driver-native composite value.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStruct {
    /// Composite type name, upper case
    pub type_name: String,
    /// Positional attribute values, independently nullable
    pub attributes: Vec<Option<DriverScalar>>,
}

/// Positional scalar getters shared by executed calls and result cursors.
///
/// Positions are 1-based throughout, matching the bind side. `get_int`
/// follows the driver convention of returning a value plus a separate
/// [`was_null`](ScalarGet::was_null) flag, because an integer slot has no
/// in-band NULL representation.
pub trait ScalarGet {
    /// Read a character column/slot, `None` when NULL.
    fn get_string(&mut self, pos: usize) -> Result<Option<String>>;

    /// Read an integer column/slot. Check [`was_null`](ScalarGet::was_null)
    /// after the call; the returned value is 0 for NULL.
    fn get_int(&mut self, pos: usize) -> Result<i64>;

    /// Read a numeric column/slot, `None` when NULL.
    fn get_number(&mut self, pos: usize) -> Result<Option<f64>>;

    /// Read a DATE or TIMESTAMP column/slot, `None` when NULL.
    fn get_timestamp(&mut self, pos: usize) -> Result<Option<NaiveDateTime>>;

    /// Read a RAW column/slot as bytes, `None` when NULL.
    fn get_raw(&mut self, pos: usize) -> Result<Option<Vec<u8>>>;

    /// True if the most recent getter call read a NULL.
    fn was_null(&self) -> bool;
}

/// A prepared statement or callable statement owned by the driver.
pub trait DriverStatement: ScalarGet {
    /// Bind a string at a 1-based position.
    fn set_string(&mut self, pos: usize, v: &str) -> Result<()>;
    /// Bind an integer.
    fn set_int(&mut self, pos: usize, v: i64) -> Result<()>;
    /// Bind a number.
    fn set_number(&mut self, pos: usize, v: f64) -> Result<()>;
    /// Bind a DATE.
    fn set_date(&mut self, pos: usize, v: NaiveDateTime) -> Result<()>;
    /// Bind a TIMESTAMP.
    fn set_timestamp(&mut self, pos: usize, v: NaiveDateTime) -> Result<()>;
    /// Bind RAW bytes.
    fn set_raw(&mut self, pos: usize, v: &[u8]) -> Result<()>;
    /// Bind a typed SQL NULL.
    fn set_null(&mut self, pos: usize, code: TypeCode) -> Result<()>;
    /// Bind a driver-native collection value.
    fn set_array(&mut self, pos: usize, v: DriverArray) -> Result<()>;
    /// Bind a driver-native composite value.
    fn set_struct(&mut self, pos: usize, v: DriverStruct) -> Result<()>;

    /// Register a 1-based position as an output parameter. Collection and
    /// composite registrations carry their database type name.
    fn register_out(&mut self, pos: usize, code: TypeCode, type_name: Option<&str>) -> Result<()>;

    /// Execute without producing a cursor (DML or a procedure call).
    fn execute(&mut self) -> Result<()>;

    /// Execute a query, producing a cursor.
    fn execute_query(&mut self) -> Result<Box<dyn DriverRows>>;

    /// Read back an OUT collection after execution.
    fn get_array(&mut self, pos: usize) -> Result<DriverArray>;

    /// Read back an OUT composite after execution.
    fn get_struct(&mut self, pos: usize) -> Result<DriverStruct>;

    /// Read back an OUT ref cursor after execution.
    fn get_cursor(&mut self, pos: usize) -> Result<Box<dyn DriverRows>>;

    /// Release the driver-side resource. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// A driver-owned result cursor.
pub trait DriverRows: ScalarGet {
    /// Advance to the next row. Returns false once the cursor is exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Number of columns in the cursor.
    fn column_count(&self) -> usize;

    /// Column name at a 1-based position, case as reported by the driver.
    fn column_name(&self, pos: usize) -> Result<String>;

    /// Column type name at a 1-based position, e.g. `VARCHAR2` or `NUMBER`.
    fn column_type_name(&self, pos: usize) -> Result<String>;

    /// Release the cursor. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// The connection-shaped collaborator this crate marshals through.
pub trait Driver {
    /// Prepare a direct SQL statement.
    fn prepare_statement(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>>;

    /// Prepare a stored-procedure call.
    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>>;

    /// Look up the element base type name of a named collection type.
    ///
    /// One round trip; fails with [`crate::Error::TypeNotFound`] for an
    /// unknown name. Callers cache the result per codec instance.
    fn collection_element_type(&mut self, type_name: &str) -> Result<String>;

    /// Look up the ordered attribute base type names of a named composite
    /// type. Same contract as
    /// [`collection_element_type`](Driver::collection_element_type).
    fn composite_attribute_types(&mut self, type_name: &str) -> Result<Vec<String>>;
}
