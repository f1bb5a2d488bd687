//! An in-memory driver for tests and examples.
//!
//! `MockDriver` implements the [`crate::driver`] traits over a scripted
//! registry: collection/composite metadata for descriptor resolution,
//! procedures as functions from bound input slots to output slots, and
//! queries as literal tables. Metadata lookups are counted so tests can
//! assert the at-most-once descriptor round-trip invariant.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::driver::{
    Driver, DriverArray, DriverRows, DriverStatement, DriverStruct, ScalarGet, TypeCode,
};
use crate::error::{Error, Result};

/// A slot or cell value as the mock driver stores it.
#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    /// A typed NULL
    Null(TypeCode),
    /// Character data
    Varchar(String),
    /// An integer
    Int(i64),
    /// A number
    Number(f64),
    /// A DATE
    Date(NaiveDateTime),
    /// A TIMESTAMP
    Timestamp(NaiveDateTime),
    /// RAW bytes
    Raw(Vec<u8>),
    /// A collection value
    Array(DriverArray),
    /// A composite value
    Struct(DriverStruct),
    /// A ref cursor over a scripted table
    Cursor(MockTable),
}

/// A scripted query result: column (name, type name) pairs plus rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MockTable {
    /// Column names and driver type names, in order
    pub columns: Vec<(String, String)>,
    /// Row data, one cell per column
    pub rows: Vec<Vec<MockValue>>,
}

type ProcFn = Rc<dyn Fn(&[Option<MockValue>]) -> Result<Vec<Option<MockValue>>>>;

#[derive(Default)]
struct MockDb {
    collections: HashMap<String, String>,
    composites: HashMap<String, Vec<String>>,
    procedures: HashMap<String, ProcFn>,
    queries: HashMap<String, MockTable>,
    updates: HashSet<String>,
    describe_counts: HashMap<String, usize>,
    statement_closes: usize,
}

/// An in-memory [`Driver`] built from scripted definitions.
#[derive(Default)]
pub struct MockDriver {
    db: Rc<RefCell<MockDb>>,
}

impl MockDriver {
    /// An empty mock database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a collection type and the element base type its descriptor
    /// reports.
    pub fn define_collection(&mut self, type_name: &str, element_type: &str) {
        self.db
            .borrow_mut()
            .collections
            .insert(type_name.to_uppercase(), element_type.to_string());
    }

    /// Define a composite type and its ordered attribute base type names.
    pub fn define_composite(&mut self, type_name: &str, attribute_types: &[&str]) {
        self.db.borrow_mut().composites.insert(
            type_name.to_uppercase(),
            attribute_types.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Define a procedure as a function from bound input slots (1-based
    /// position = index + 1) to output slots. Output slots the function
    /// leaves out read back as NULL.
    pub fn define_procedure<F>(&mut self, call_text: &str, f: F)
    where
        F: Fn(&[Option<MockValue>]) -> Result<Vec<Option<MockValue>>> + 'static,
    {
        self.db
            .borrow_mut()
            .procedures
            .insert(call_text.to_string(), Rc::new(f));
    }

    /// Define a procedure whose execution fails with a driver error
    /// carrying `message`, for exercising failure classification.
    pub fn define_failing_procedure(&mut self, call_text: &str, message: &str) {
        let message = message.to_string();
        self.define_procedure(call_text, move |_| Err(Error::Driver(message.clone())));
    }

    /// Define a query and the table it produces.
    pub fn define_query(
        &mut self,
        sql: &str,
        columns: Vec<(&str, &str)>,
        rows: Vec<Vec<MockValue>>,
    ) {
        self.db.borrow_mut().queries.insert(
            sql.to_string(),
            MockTable {
                columns: columns
                    .into_iter()
                    .map(|(n, t)| (n.to_string(), t.to_string()))
                    .collect(),
                rows,
            },
        );
    }

    /// Define a non-query statement that executes without effect.
    pub fn define_update(&mut self, sql: &str) {
        self.db.borrow_mut().updates.insert(sql.to_string());
    }

    /// How many statements have been released so far.
    pub fn statement_close_count(&self) -> usize {
        self.db.borrow().statement_closes
    }

    /// How many times the metadata for `type_name` has been looked up.
    pub fn describe_count(&self, type_name: &str) -> usize {
        self.db
            .borrow()
            .describe_counts
            .get(&type_name.to_uppercase())
            .copied()
            .unwrap_or(0)
    }

    fn statement(&self, text: &str) -> Box<dyn DriverStatement> {
        Box::new(MockStatement {
            db: Rc::clone(&self.db),
            text: text.to_string(),
            slots: Vec::new(),
            registered: Vec::new(),
            out_values: Vec::new(),
            was_null: false,
            closed: false,
        })
    }
}

impl Driver for MockDriver {
    fn prepare_statement(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>> {
        Ok(self.statement(sql))
    }

    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>> {
        Ok(self.statement(sql))
    }

    fn collection_element_type(&mut self, type_name: &str) -> Result<String> {
        let mut db = self.db.borrow_mut();
        let key = type_name.to_uppercase();
        *db.describe_counts.entry(key.clone()).or_insert(0) += 1;
        db.collections
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::TypeNotFound(key))
    }

    fn composite_attribute_types(&mut self, type_name: &str) -> Result<Vec<String>> {
        let mut db = self.db.borrow_mut();
        let key = type_name.to_uppercase();
        *db.describe_counts.entry(key.clone()).or_insert(0) += 1;
        db.composites
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::TypeNotFound(key))
    }
}

struct MockStatement {
    db: Rc<RefCell<MockDb>>,
    text: String,
    slots: Vec<Option<MockValue>>,
    registered: Vec<Option<(TypeCode, Option<String>)>>,
    out_values: Vec<Option<MockValue>>,
    was_null: bool,
    closed: bool,
}

impl MockStatement {
    fn put(&mut self, pos: usize, v: MockValue) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidUsage("statement is closed".into()));
        }
        if pos < 1 {
            return Err(Error::Driver(format!("invalid bind position {}", pos)));
        }
        if self.slots.len() < pos {
            self.slots.resize(pos, None);
        }
        self.slots[pos - 1] = Some(v);
        Ok(())
    }

    fn out_cell(&mut self, pos: usize) -> Option<&MockValue> {
        let cell = self
            .out_values
            .get(pos.wrapping_sub(1))
            .and_then(|c| c.as_ref());
        let is_null = matches!(cell, None | Some(MockValue::Null(_)));
        self.was_null = is_null;
        if is_null { None } else { cell }
    }
}

impl ScalarGet for MockStatement {
    fn get_string(&mut self, pos: usize) -> Result<Option<String>> {
        match self.out_cell(pos) {
            None => Ok(None),
            Some(MockValue::Varchar(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::Driver(format!("slot {} is not a string: {:?}", pos, other))),
        }
    }

    fn get_int(&mut self, pos: usize) -> Result<i64> {
        match self.out_cell(pos) {
            None => Ok(0),
            Some(MockValue::Int(i)) => Ok(*i),
            Some(other) => Err(Error::Driver(format!("slot {} is not an integer: {:?}", pos, other))),
        }
    }

    fn get_number(&mut self, pos: usize) -> Result<Option<f64>> {
        match self.out_cell(pos) {
            None => Ok(None),
            Some(MockValue::Number(n)) => Ok(Some(*n)),
            Some(MockValue::Int(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(Error::Driver(format!("slot {} is not a number: {:?}", pos, other))),
        }
    }

    fn get_timestamp(&mut self, pos: usize) -> Result<Option<NaiveDateTime>> {
        match self.out_cell(pos) {
            None => Ok(None),
            Some(MockValue::Date(dt)) | Some(MockValue::Timestamp(dt)) => Ok(Some(*dt)),
            Some(other) => Err(Error::Driver(format!("slot {} is not a datetime: {:?}", pos, other))),
        }
    }

    fn get_raw(&mut self, pos: usize) -> Result<Option<Vec<u8>>> {
        match self.out_cell(pos) {
            None => Ok(None),
            Some(MockValue::Raw(bytes)) => Ok(Some(bytes.clone())),
            Some(other) => Err(Error::Driver(format!("slot {} is not raw: {:?}", pos, other))),
        }
    }

    fn was_null(&self) -> bool {
        self.was_null
    }
}

impl DriverStatement for MockStatement {
    fn set_string(&mut self, pos: usize, v: &str) -> Result<()> {
        self.put(pos, MockValue::Varchar(v.to_string()))
    }

    fn set_int(&mut self, pos: usize, v: i64) -> Result<()> {
        self.put(pos, MockValue::Int(v))
    }

    fn set_number(&mut self, pos: usize, v: f64) -> Result<()> {
        self.put(pos, MockValue::Number(v))
    }

    fn set_date(&mut self, pos: usize, v: NaiveDateTime) -> Result<()> {
        self.put(pos, MockValue::Date(v))
    }

    fn set_timestamp(&mut self, pos: usize, v: NaiveDateTime) -> Result<()> {
        self.put(pos, MockValue::Timestamp(v))
    }

    fn set_raw(&mut self, pos: usize, v: &[u8]) -> Result<()> {
        self.put(pos, MockValue::Raw(v.to_vec()))
    }

    fn set_null(&mut self, pos: usize, code: TypeCode) -> Result<()> {
        self.put(pos, MockValue::Null(code))
    }

    fn set_array(&mut self, pos: usize, v: DriverArray) -> Result<()> {
        self.put(pos, MockValue::Array(v))
    }

    fn set_struct(&mut self, pos: usize, v: DriverStruct) -> Result<()> {
        self.put(pos, MockValue::Struct(v))
    }

    fn register_out(&mut self, pos: usize, code: TypeCode, type_name: Option<&str>) -> Result<()> {
        if pos < 1 {
            return Err(Error::Driver(format!("invalid bind position {}", pos)));
        }
        if self.registered.len() < pos {
            self.registered.resize(pos, None);
        }
        self.registered[pos - 1] = Some((code, type_name.map(str::to_string)));
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidUsage("statement is closed".into()));
        }
        let proc = self.db.borrow().procedures.get(&self.text).cloned();
        if let Some(proc) = proc {
            self.out_values = proc(&self.slots)?;
            return Ok(());
        }
        if self.db.borrow().updates.contains(&self.text) {
            return Ok(());
        }
        Err(Error::Driver(format!("nothing defined for: {}", self.text)))
    }

    fn execute_query(&mut self) -> Result<Box<dyn DriverRows>> {
        if self.closed {
            return Err(Error::InvalidUsage("statement is closed".into()));
        }
        let table = self
            .db
            .borrow()
            .queries
            .get(&self.text)
            .cloned()
            .ok_or_else(|| Error::Driver(format!("no query defined for: {}", self.text)))?;
        Ok(Box::new(MockRows::new(table)))
    }

    fn get_array(&mut self, pos: usize) -> Result<DriverArray> {
        match self.out_cell(pos) {
            Some(MockValue::Array(a)) => Ok(a.clone()),
            other => Err(Error::Driver(format!("slot {} is not an array: {:?}", pos, other))),
        }
    }

    fn get_struct(&mut self, pos: usize) -> Result<DriverStruct> {
        match self.out_cell(pos) {
            Some(MockValue::Struct(s)) => Ok(s.clone()),
            other => Err(Error::Driver(format!("slot {} is not a struct: {:?}", pos, other))),
        }
    }

    fn get_cursor(&mut self, pos: usize) -> Result<Box<dyn DriverRows>> {
        match self.out_cell(pos) {
            Some(MockValue::Cursor(table)) => Ok(Box::new(MockRows::new(table.clone()))),
            other => Err(Error::Driver(format!("slot {} is not a cursor: {:?}", pos, other))),
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.db.borrow_mut().statement_closes += 1;
        }
        Ok(())
    }
}

struct MockRows {
    table: MockTable,
    /// 0 before the first row, then the 1-based current row
    row: usize,
    open: bool,
    was_null: bool,
}

impl MockRows {
    fn new(table: MockTable) -> Self {
        Self {
            table,
            row: 0,
            open: true,
            was_null: false,
        }
    }

    fn cell(&mut self, pos: usize) -> Result<Option<&MockValue>> {
        if !self.open {
            return Err(Error::InvalidUsage("cursor is closed".into()));
        }
        let row = self
            .table
            .rows
            .get(self.row.wrapping_sub(1))
            .ok_or_else(|| Error::Driver("no current row".into()))?;
        let cell = row
            .get(pos.wrapping_sub(1))
            .ok_or_else(|| Error::Driver(format!("no column at position {}", pos)))?;
        self.was_null = matches!(cell, MockValue::Null(_));
        if self.was_null {
            Ok(None)
        } else {
            Ok(Some(cell))
        }
    }
}

impl ScalarGet for MockRows {
    fn get_string(&mut self, pos: usize) -> Result<Option<String>> {
        match self.cell(pos)? {
            None => Ok(None),
            Some(MockValue::Varchar(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::Driver(format!("column {} is not a string: {:?}", pos, other))),
        }
    }

    fn get_int(&mut self, pos: usize) -> Result<i64> {
        match self.cell(pos)? {
            None => Ok(0),
            Some(MockValue::Int(i)) => Ok(*i),
            Some(other) => Err(Error::Driver(format!("column {} is not an integer: {:?}", pos, other))),
        }
    }

    fn get_number(&mut self, pos: usize) -> Result<Option<f64>> {
        match self.cell(pos)? {
            None => Ok(None),
            Some(MockValue::Number(n)) => Ok(Some(*n)),
            Some(MockValue::Int(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(Error::Driver(format!("column {} is not a number: {:?}", pos, other))),
        }
    }

    fn get_timestamp(&mut self, pos: usize) -> Result<Option<NaiveDateTime>> {
        match self.cell(pos)? {
            None => Ok(None),
            Some(MockValue::Date(dt)) | Some(MockValue::Timestamp(dt)) => Ok(Some(*dt)),
            Some(other) => Err(Error::Driver(format!("column {} is not a datetime: {:?}", pos, other))),
        }
    }

    fn get_raw(&mut self, pos: usize) -> Result<Option<Vec<u8>>> {
        match self.cell(pos)? {
            None => Ok(None),
            Some(MockValue::Raw(bytes)) => Ok(Some(bytes.clone())),
            Some(other) => Err(Error::Driver(format!("column {} is not raw: {:?}", pos, other))),
        }
    }

    fn was_null(&self) -> bool {
        self.was_null
    }
}

impl DriverRows for MockRows {
    fn next(&mut self) -> Result<bool> {
        if !self.open {
            return Err(Error::InvalidUsage("cursor is closed".into()));
        }
        self.row += 1;
        Ok(self.row <= self.table.rows.len())
    }

    fn column_count(&self) -> usize {
        self.table.columns.len()
    }

    fn column_name(&self, pos: usize) -> Result<String> {
        self.table
            .columns
            .get(pos.wrapping_sub(1))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| Error::Driver(format!("no column at position {}", pos)))
    }

    fn column_type_name(&self, pos: usize) -> Result<String> {
        self.table
            .columns
            .get(pos.wrapping_sub(1))
            .map(|(_, type_name)| type_name.clone())
            .ok_or_else(|| Error::Driver(format!("no column at position {}", pos)))
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}
