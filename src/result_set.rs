//! Row-at-a-time consumption of a driver cursor.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::binding;
use crate::driver::DriverRows;
use crate::error::{Error, Result};
use crate::value::Value;

type SharedRows = Rc<RefCell<Option<Box<dyn DriverRows>>>>;

/// A result cursor decoded one row at a time.
///
/// Rows come back either as an ordered `Vec<Value>` (one entry per column)
/// or as a column-name keyed map, with names cased exactly as the driver
/// reports them. Exhausting the cursor closes it: the first read past the
/// last row returns `None`, every operation after that fails with
/// [`Error::NoResultSet`].
///
/// The cursor handle is shared, so a `ResultSet` pulled out of a ref cursor
/// slot can be cloned into a [`Value`] and still consumed.
#[derive(Clone)]
pub struct ResultSet {
    inner: SharedRows,
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.inner.borrow().is_some();
        f.debug_struct("ResultSet").field("open", &open).finish()
    }
}

impl ResultSet {
    pub(crate) fn new(rows: Box<dyn DriverRows>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(rows))),
        }
    }

    pub(crate) fn handle(&self) -> &SharedRows {
        &self.inner
    }

    /// Advance one row and decode it as an ordered sequence. Returns `None`
    /// and closes the cursor once no rows remain.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        self.advance(row_as_array)
    }

    /// Advance one row and decode it as a column-name keyed map.
    pub fn next_hash(&mut self) -> Result<Option<HashMap<String, Value>>> {
        self.advance(row_as_hash)
    }

    /// Run `f` for every remaining row as an ordered sequence, then close
    /// the cursor. The cursor is closed even when `f` fails.
    pub fn each_row<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(Vec<Value>) -> Result<()>,
    {
        self.each(row_as_array, f)
    }

    /// Run `f` for every remaining row as a column-name keyed map.
    pub fn each_hash<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(HashMap<String, Value>) -> Result<()>,
    {
        self.each(row_as_hash, f)
    }

    /// Collect every remaining row as ordered sequences, then close the
    /// cursor. A cursor with zero rows collects to an empty vector.
    pub fn all_rows(&mut self) -> Result<Vec<Vec<Value>>> {
        self.collect_rows(row_as_array)
    }

    /// Collect every remaining row as column-name keyed maps.
    pub fn all_hashes(&mut self) -> Result<Vec<HashMap<String, Value>>> {
        self.collect_rows(row_as_hash)
    }

    /// Close the cursor if it is open; a no-op otherwise.
    pub fn close(&mut self) -> Result<()> {
        let mut guard = self.inner.borrow_mut();
        if let Some(mut rows) = guard.take() {
            rows.close()?;
        }
        Ok(())
    }

    fn advance<T>(&self, decode: fn(&mut dyn DriverRows) -> Result<T>) -> Result<Option<T>> {
        let mut guard = self.inner.borrow_mut();
        let rows = guard.as_mut().ok_or(Error::NoResultSet)?;
        if rows.next()? {
            decode(rows.as_mut()).map(Some)
        } else {
            if let Some(mut rows) = guard.take() {
                rows.close()?;
            }
            Ok(None)
        }
    }

    fn each<T, F>(&mut self, decode: fn(&mut dyn DriverRows) -> Result<T>, mut f: F) -> Result<()>
    where
        F: FnMut(T) -> Result<()>,
    {
        loop {
            match self.advance(decode) {
                Ok(Some(row)) => {
                    if let Err(e) = f(row) {
                        self.close()?;
                        return Err(e);
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    self.close()?;
                    return Err(e);
                }
            }
        }
    }

    fn collect_rows<T>(&mut self, decode: fn(&mut dyn DriverRows) -> Result<T>) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.each(decode, |row| {
            out.push(row);
            Ok(())
        })?;
        Ok(out)
    }
}

fn row_as_array(rows: &mut dyn DriverRows) -> Result<Vec<Value>> {
    let cols = rows.column_count();
    let mut row = Vec::with_capacity(cols);
    for i in 1..=cols {
        let type_name = rows.column_type_name(i)?;
        row.push(binding::retrieve_value(rows, &type_name, i)?);
    }
    Ok(row)
}

fn row_as_hash(rows: &mut dyn DriverRows) -> Result<HashMap<String, Value>> {
    let cols = rows.column_count();
    let mut row = HashMap::with_capacity(cols);
    for i in 1..=cols {
        let name = rows.column_name(i)?;
        let type_name = rows.column_type_name(i)?;
        row.insert(name, binding::retrieve_value(rows, &type_name, i)?);
    }
    Ok(row)
}
