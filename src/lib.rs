//! Typed bind and fetch marshaling for Oracle-style statements and stored
//! procedure calls.
//!
//! # Features
//!
//! - **Tagged bind slots**: IN, typed IN, OUT and IN OUT parameters with
//!   explicit typed NULLs
//! - **Collection and composite codecs**: reusable binders that cache their
//!   type descriptors and nest (collections of records)
//! - **Row decoding**: result cursors as ordered sequences or column-name
//!   keyed maps, driven by the driver-reported column types
//! - **Driver seam**: the connection is a trait; an in-memory mock ships in
//!   [`mock`]
//!
//! # Example
//!
//! ```
//! use simple_oracle::mock::MockDriver;
//! use simple_oracle::{BindSlot, BindType, DbCall, Value};
//!
//! fn main() -> simple_oracle::Result<()> {
//!     let mut db = MockDriver::new();
//!     db.define_procedure("begin :out := upper(:in); end;", |slots| {
//!         let out = match slots.get(1) {
//!             Some(Some(simple_oracle::mock::MockValue::Varchar(s))) => {
//!                 Some(simple_oracle::mock::MockValue::Varchar(s.to_uppercase()))
//!             }
//!             _ => None,
//!         };
//!         Ok(vec![out, None])
//!     });
//!
//!     let mut call = DbCall::prepare(&mut db, "begin :out := upper(:in); end;")?;
//!     call.execute(&mut db, vec![
//!         BindSlot::Out(BindType::Varchar),
//!         BindSlot::In(Value::from("abc")),
//!     ])?;
//!     assert_eq!(call.get(&mut db, 1)?, Value::from("ABC"));
//!     call.close()?;
//!     Ok(())
//! }
//! ```

pub mod array;
pub mod binding;
pub mod call;
pub mod conversion;
mod descriptor;
pub mod driver;
pub mod error;
pub mod mock;
pub mod record;
pub mod result_set;
pub mod sql;
pub mod value;

pub use array::ArrayBind;
pub use binding::{BindSlot, BindType};
pub use call::DbCall;
pub use driver::{Driver, DriverRows, DriverStatement, ScalarGet, TypeCode};
pub use error::{Error, Result};
pub use record::RecordBind;
pub use result_set::ResultSet;
pub use sql::Sql;
pub use value::Value;
