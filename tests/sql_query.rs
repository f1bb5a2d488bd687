//! SQL execution, query detection and the three cursor consumption modes.

use chrono::NaiveDate;
use simple_oracle::mock::{MockDriver, MockValue};
use simple_oracle::{Error, Sql, Value};

const DUAL_PAIR: &str =
    "select 'a' a_val, 1 b_val from dual union all select 'aa', 2 from dual";

fn dual_pair_driver() -> MockDriver {
    let mut db = MockDriver::new();
    db.define_query(
        DUAL_PAIR,
        vec![("A_VAL", "VARCHAR2"), ("B_VAL", "NUMBER")],
        vec![
            vec![MockValue::Varchar("a".into()), MockValue::Int(1)],
            vec![MockValue::Varchar("aa".into()), MockValue::Int(2)],
        ],
    );
    db
}

#[test]
fn test_all_rows_collects_ordered_arrays() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    assert_eq!(
        sql.all_rows().unwrap(),
        vec![
            vec![Value::from("a"), Value::Float(1.0)],
            vec![Value::from("aa"), Value::Float(2.0)],
        ]
    );
}

#[test]
fn test_all_hashes_keys_rows_by_column_name() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    let hashes = sql.all_hashes().unwrap();
    assert_eq!(hashes.len(), 2);
    assert_eq!(hashes[0]["A_VAL"], Value::from("a"));
    assert_eq!(hashes[0]["B_VAL"], Value::Float(1.0));
    assert_eq!(hashes[1]["A_VAL"], Value::from("aa"));
    assert_eq!(hashes[1]["B_VAL"], Value::Float(2.0));
}

#[test]
fn test_next_row_yields_none_exactly_once_then_fails() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    assert!(sql.next_row().unwrap().is_some());
    assert!(sql.next_row().unwrap().is_some());
    assert!(sql.next_row().unwrap().is_none());
    // Exhaustion closed the cursor; further reads are misuse.
    assert!(matches!(sql.next_row(), Err(Error::NoResultSet)));
}

#[test]
fn test_all_rows_consumes_the_cursor() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    assert_eq!(sql.all_rows().unwrap().len(), 2);
    assert!(matches!(sql.all_rows(), Err(Error::NoResultSet)));
}

#[test]
fn test_each_row_visits_every_row_in_order() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    let mut seen = Vec::new();
    sql.each_row(|row| {
        seen.push(row[0].clone());
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, vec![Value::from("a"), Value::from("aa")]);
}

#[test]
fn test_each_hash_stops_and_closes_on_callback_error() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    let err = sql
        .each_hash(|_| Err(Error::InvalidUsage("stop".into())))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUsage(_)));
    assert!(matches!(sql.next_hash(), Err(Error::NoResultSet)));
}

#[test]
fn test_empty_query_yields_no_rows() {
    let mut db = MockDriver::new();
    db.define_query("select * from t_empty", vec![("A", "VARCHAR2")], vec![]);
    let mut sql = Sql::execute_immediate(&mut db, "select * from t_empty", vec![]).unwrap();
    assert!(sql.next_row().unwrap().is_none());
    assert!(matches!(sql.next_row(), Err(Error::NoResultSet)));
}

#[test]
fn test_column_decode_follows_the_declared_type() {
    let dt = NaiveDate::from_ymd_opt(2013, 1, 31)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let mut db = MockDriver::new();
    db.define_query(
        "select * from t_mixed",
        vec![
            ("N", "INTEGER"),
            ("D", "DATE"),
            ("R", "RAW"),
            ("MISSING", "INTEGER"),
        ],
        vec![vec![
            MockValue::Int(5),
            MockValue::Date(dt),
            MockValue::Raw(vec![0xDE, 0xAD]),
            MockValue::Null(simple_oracle::TypeCode::Integer),
        ]],
    );
    let mut sql = Sql::execute_immediate(&mut db, "select * from t_mixed", vec![]).unwrap();
    let row = sql.next_row().unwrap().unwrap();
    assert_eq!(
        row,
        vec![
            Value::Int(5),
            Value::Timestamp(dt),
            Value::Raw("DEAD".into()),
            Value::Null,
        ]
    );
}

#[test]
fn test_unknown_column_type_is_reported() {
    let mut db = MockDriver::new();
    db.define_query(
        "select b from t_blob",
        vec![("B", "BLOB")],
        vec![vec![MockValue::Raw(vec![1])]],
    );
    let mut sql = Sql::execute_immediate(&mut db, "select b from t_blob", vec![]).unwrap();
    let err = sql.next_row().unwrap_err();
    assert!(matches!(err, Error::UnknownSqlType(name) if name == "BLOB"));
}

#[test]
fn test_execute_immediate_closes_non_query_statements() {
    let mut db = MockDriver::new();
    db.define_update("delete from t_lock");
    let mut sql = Sql::execute_immediate(&mut db, "delete from t_lock", vec![]).unwrap();
    assert!(!sql.is_open());
    assert!(matches!(sql.next_row(), Err(Error::NoResultSet)));
    sql.close().unwrap();
}

#[test]
fn test_prepared_statement_survives_execution_and_reruns() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::prepare(&mut db, DUAL_PAIR).unwrap();
    for _ in 0..2 {
        sql.execute(&mut db, vec![]).unwrap();
        assert_eq!(sql.all_rows().unwrap().len(), 2);
    }
    assert!(sql.is_open());
    sql.close().unwrap();
    assert!(!sql.is_open());
}

#[test]
fn test_prepared_non_query_stays_open() {
    let mut db = MockDriver::new();
    db.define_update("update t set a = 1");
    let mut sql = Sql::prepare(&mut db, "update t set a = 1").unwrap();
    sql.execute(&mut db, vec![]).unwrap();
    assert!(sql.is_open());
    sql.execute(&mut db, vec![]).unwrap();
    sql.close().unwrap();
}

#[test]
fn test_close_is_idempotent() {
    let mut db = dual_pair_driver();
    let mut sql = Sql::execute_immediate(&mut db, DUAL_PAIR, vec![]).unwrap();
    sql.close().unwrap();
    sql.close().unwrap();
    assert!(matches!(sql.execute(&mut db, vec![]), Err(Error::InvalidUsage(_))));
}

#[test]
fn test_statement_text_may_contain_multibyte_characters() {
    let mut db = MockDriver::new();
    // Detection must not split the statement text inside a character; an
    // undefined call surfaces as a driver error, not a panic.
    let err = Sql::execute_immediate(&mut db, "call ф()", vec![]).unwrap_err();
    assert!(err.driver_message().is_some());
}

#[test]
fn test_execute_immediate_releases_the_statement_on_failure() {
    let mut db = MockDriver::new();
    assert!(Sql::execute_immediate(&mut db, "delete from t_missing", vec![]).is_err());
    assert_eq!(db.statement_close_count(), 1);
}

#[test]
fn test_execution_failures_are_classified() {
    let mut db = MockDriver::new();
    // Nothing is defined for this text, so the mock raises a driver error.
    let mut sql = Sql::prepare(&mut db, "delete from t_missing").unwrap();
    let err = sql.execute(&mut db, vec![]).unwrap_err();
    assert!(err.driver_message().is_some());
}
