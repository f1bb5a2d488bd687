//! Prepared and directly executed SQL statements.

use std::collections::HashMap;

use crate::binding::{self, BindSlot};
use crate::driver::{Driver, DriverStatement};
use crate::error::{classify_execution, Error, Result};
use crate::result_set::ResultSet;
use crate::value::Value;

/// A prepared SQL statement and the cursor it produces.
///
/// [`Sql::prepare`] builds a reusable statement that survives execution;
/// [`Sql::execute_immediate`] prepares, binds and executes in one step and
/// closes the statement resource right after a non-query execution, since a
/// handle that was never asked for will not be reused.
///
/// ```
/// use simple_oracle::mock::{MockDriver, MockValue};
/// use simple_oracle::{Sql, Value};
///
/// # fn main() -> simple_oracle::Result<()> {
/// let mut db = MockDriver::new();
/// db.define_query(
///     "select owner from t_lock",
///     vec![("OWNER", "VARCHAR2")],
///     vec![vec![MockValue::Varchar("sess_1".into())]],
/// );
///
/// let mut sql = Sql::execute_immediate(&mut db, "select owner from t_lock", vec![])?;
/// let rows = sql.all_rows()?;
/// assert_eq!(rows, vec![vec![Value::from("sess_1")]]);
/// sql.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Sql {
    sql: String,
    statement: Option<Box<dyn DriverStatement>>,
    result_set: Option<ResultSet>,
    auto_statement_close: bool,
}

impl std::fmt::Debug for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sql")
            .field("sql", &self.sql)
            .field("statement", &self.statement.as_ref().map(|_| "..."))
            .field("result_set", &self.result_set.as_ref().map(|_| "..."))
            .field("auto_statement_close", &self.auto_statement_close)
            .finish()
    }
}

impl Sql {
    /// Prepare `sql` for repeated execution. The statement is never closed
    /// automatically; release it with [`close`](Sql::close).
    pub fn prepare(conn: &mut dyn Driver, sql: &str) -> Result<Self> {
        Ok(Self {
            sql: sql.to_string(),
            statement: Some(conn.prepare_statement(sql)?),
            result_set: None,
            auto_statement_close: false,
        })
    }

    /// Prepare, bind and execute in one step.
    pub fn execute_immediate(
        conn: &mut dyn Driver,
        sql: &str,
        binds: Vec<BindSlot>,
    ) -> Result<Self> {
        let mut this = Self {
            sql: sql.to_string(),
            statement: Some(conn.prepare_statement(sql)?),
            result_set: None,
            auto_statement_close: true,
        };
        if let Err(err) = this.execute(conn, binds) {
            // The caller never sees the handle, so release it here; the
            // execution failure is the one worth reporting.
            let _ = this.close_statement();
            return Err(err);
        }
        Ok(this)
    }

    /// Bind every slot at its 1-based position and execute.
    ///
    /// A statement is treated as a query iff it starts, ignoring leading
    /// whitespace, with the case-insensitive keyword `select`; a query
    /// retains its cursor for the row-consumption methods, anything else
    /// discards it.
    pub fn execute(&mut self, conn: &mut dyn Driver, binds: Vec<BindSlot>) -> Result<&mut Self> {
        if let Some(mut old) = self.result_set.take() {
            old.close()?;
        }
        let statement = self
            .statement
            .as_mut()
            .ok_or_else(|| Error::InvalidUsage("statement is closed".into()))?;
        for (i, slot) in binds.iter().enumerate() {
            binding::bind_slot(conn, statement.as_mut(), slot, i + 1)?;
        }
        if is_query(&self.sql) {
            let rows = statement.execute_query().map_err(classify_execution)?;
            self.result_set = Some(ResultSet::new(rows));
        } else {
            statement.execute().map_err(classify_execution)?;
            if self.auto_statement_close {
                self.close_statement()?;
            }
        }
        Ok(self)
    }

    /// The open cursor of the last query execution, if any.
    pub fn result_set(&mut self) -> Option<&mut ResultSet> {
        self.result_set.as_mut()
    }

    /// See [`ResultSet::next_row`].
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        self.open_result_set()?.next_row()
    }

    /// See [`ResultSet::next_hash`].
    pub fn next_hash(&mut self) -> Result<Option<HashMap<String, Value>>> {
        self.open_result_set()?.next_hash()
    }

    /// See [`ResultSet::each_row`].
    pub fn each_row<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(Vec<Value>) -> Result<()>,
    {
        self.open_result_set()?.each_row(f)
    }

    /// See [`ResultSet::each_hash`].
    pub fn each_hash<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(HashMap<String, Value>) -> Result<()>,
    {
        self.open_result_set()?.each_hash(f)
    }

    /// See [`ResultSet::all_rows`].
    pub fn all_rows(&mut self) -> Result<Vec<Vec<Value>>> {
        self.open_result_set()?.all_rows()
    }

    /// See [`ResultSet::all_hashes`].
    pub fn all_hashes(&mut self) -> Result<Vec<HashMap<String, Value>>> {
        self.open_result_set()?.all_hashes()
    }

    /// Close the cursor, then the statement. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut rs) = self.result_set.take() {
            rs.close()?;
        }
        self.close_statement()
    }

    /// True until the statement resource is released.
    pub fn is_open(&self) -> bool {
        self.statement.is_some()
    }

    fn close_statement(&mut self) -> Result<()> {
        if let Some(mut statement) = self.statement.take() {
            statement.close()?;
        }
        Ok(())
    }

    fn open_result_set(&mut self) -> Result<&mut ResultSet> {
        self.result_set.as_mut().ok_or(Error::NoResultSet)
    }
}

// TODO: a query headed by a WITH clause is currently treated as a
// non-query; recognizing common table expressions needs more than a
// leading-keyword check.
fn is_query(sql: &str) -> bool {
    // Compare raw bytes; slicing the str could split a multi-byte character.
    let head = sql.trim_start().as_bytes();
    head.get(..6).is_some_and(|h| h.eq_ignore_ascii_case(b"select"))
}
