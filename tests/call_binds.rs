//! Stored-procedure call binding and retrieval against the mock driver.

use chrono::{NaiveDate, NaiveDateTime};
use simple_oracle::mock::{MockDriver, MockTable, MockValue};
use simple_oracle::{BindSlot, BindType, DbCall, Error, Value};

const ECHO: &str = "begin :out := :in; end;";

/// An echo procedure: the value bound at position 2 comes back at position 1.
fn echo_driver() -> MockDriver {
    let mut db = MockDriver::new();
    db.define_procedure(ECHO, |slots| {
        Ok(vec![slots.get(1).cloned().flatten(), None])
    });
    db
}

fn round_trip(ty: BindType, v: Value) -> Value {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![BindSlot::Out(ty.clone()), BindSlot::InTyped(ty, v)],
    )
    .unwrap();
    let out = call.get(&mut db, 1).unwrap();
    call.close().unwrap();
    out
}

#[test]
fn test_varchar_round_trip() {
    assert_eq!(
        round_trip(BindType::Varchar, Value::from("ABC")),
        Value::from("ABC")
    );
}

#[test]
fn test_integer_round_trip() {
    assert_eq!(round_trip(BindType::Integer, Value::Int(42)), Value::Int(42));
}

#[test]
fn test_number_round_trip() {
    assert_eq!(
        round_trip(BindType::Number, Value::Float(9.123456)),
        Value::Float(9.123456)
    );
}

#[test]
fn test_number_accepts_integer_input() {
    assert_eq!(round_trip(BindType::Number, Value::Int(7)), Value::Float(7.0));
}

#[test]
fn test_date_round_trip() {
    let d = NaiveDate::from_ymd_opt(2013, 1, 31).unwrap();
    assert_eq!(round_trip(BindType::Date, Value::Date(d)), Value::Date(d));
}

#[test]
fn test_timestamp_round_trip() {
    let dt: NaiveDateTime = NaiveDate::from_ymd_opt(2013, 1, 31)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    assert_eq!(
        round_trip(BindType::Timestamp, Value::Timestamp(dt)),
        Value::Timestamp(dt)
    );
}

#[test]
fn test_raw_out_returns_the_hex_string() {
    assert_eq!(
        round_trip(BindType::Raw, Value::Raw("DEDEDEDEFF".into())),
        Value::Raw("DEDEDEDEFF".into())
    );
}

#[test]
fn test_inout_slot_round_trips_through_a_single_position() {
    // The procedure echoes position 1 back into position 1.
    let mut db = MockDriver::new();
    db.define_procedure(ECHO, |slots| Ok(vec![slots.first().cloned().flatten()]));
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![BindSlot::InOut(BindType::Number, Value::Float(1.25))],
    )
    .unwrap();
    assert_eq!(call.get(&mut db, 1).unwrap(), Value::Float(1.25));
}

#[test]
fn test_typed_null_round_trips_for_every_scalar_type() {
    for ty in [
        BindType::Date,
        BindType::Timestamp,
        BindType::Varchar,
        BindType::Integer,
        BindType::Number,
        BindType::Raw,
    ] {
        assert_eq!(round_trip(ty, Value::Null), Value::Null);
    }
}

#[test]
fn test_out_only_slot_reads_back_null_when_nothing_was_written() {
    let mut db = MockDriver::new();
    db.define_procedure(ECHO, |_| Ok(vec![]));
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![
            BindSlot::Out(BindType::Integer),
            BindSlot::In(Value::from("x")),
        ],
    )
    .unwrap();
    // The was-null flag overrides the integer slot's zero value.
    assert_eq!(call.get(&mut db, 1).unwrap(), Value::Null);
}

#[test]
fn test_plain_in_bind_is_returned_without_a_driver_round_trip() {
    let mut db = MockDriver::new();
    // The procedure writes nothing, so a driver read would produce NULL.
    db.define_procedure(ECHO, |_| Ok(vec![]));
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![
            BindSlot::Out(BindType::Varchar),
            BindSlot::In(Value::from("ABC")),
        ],
    )
    .unwrap();
    assert_eq!(call.get(&mut db, 2).unwrap(), Value::from("ABC"));
}

#[test]
fn test_get_zero_is_out_of_range() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![
            BindSlot::Out(BindType::Varchar),
            BindSlot::In(Value::from("ABC")),
        ],
    )
    .unwrap();
    assert!(matches!(
        call.get(&mut db, 0),
        Err(Error::BindIndexOutOfRange(0))
    ));
}

#[test]
fn test_get_past_the_bind_list_is_out_of_range() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    call.execute(
        &mut db,
        vec![
            BindSlot::Out(BindType::Varchar),
            BindSlot::In(Value::from("ABC")),
        ],
    )
    .unwrap();
    assert!(matches!(
        call.get(&mut db, 3),
        Err(Error::BindIndexOutOfRange(3))
    ));
}

#[test]
fn test_execute_immediate_prepares_and_executes_in_one_step() {
    let mut db = echo_driver();
    let mut call = DbCall::execute_immediate(
        &mut db,
        ECHO,
        vec![
            BindSlot::Out(BindType::Varchar),
            BindSlot::In(Value::from("ABC")),
        ],
    )
    .unwrap();
    assert!(call.is_open());
    assert_eq!(call.get(&mut db, 1).unwrap(), Value::from("ABC"));
    call.close().unwrap();
}

#[test]
fn test_execute_returns_self_for_chained_retrieval() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let binds = vec![
        BindSlot::Out(BindType::Varchar),
        BindSlot::In(Value::from("ABC")),
    ];
    let out = call.execute(&mut db, binds).unwrap().get(&mut db, 1).unwrap();
    assert_eq!(out, Value::from("ABC"));
}

#[test]
fn test_bare_null_in_bind_is_rejected() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call
        .execute(&mut db, vec![BindSlot::In(Value::Null)])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownBindType(name) if name == "NULL"));
}

#[test]
fn test_unsupported_bind_type_is_rejected_by_name() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call
        .execute(
            &mut db,
            vec![BindSlot::InTyped(
                BindType::Unsupported("BOOLEAN".into()),
                Value::Null,
            )],
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnknownBindType(name) if name == "BOOLEAN"));
}

#[test]
fn test_no_data_found_is_classified() {
    let mut db = MockDriver::new();
    db.define_failing_procedure(ECHO, "ORA-01403: no data found");
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call.execute(&mut db, vec![]).unwrap_err();
    assert!(matches!(err, Error::NoDataFound(_)));
}

#[test]
fn test_too_many_rows_is_classified() {
    let mut db = MockDriver::new();
    db.define_failing_procedure(ECHO, "ORA-01422: too many rows");
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call.execute(&mut db, vec![]).unwrap_err();
    assert!(matches!(err, Error::TooManyRows(_)));
}

#[test]
fn test_application_errors_are_classified() {
    let mut db = MockDriver::new();
    db.define_failing_procedure(ECHO, "ORA-20999: custom failure");
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call.execute(&mut db, vec![]).unwrap_err();
    assert!(matches!(err, Error::ApplicationError(_)));
}

#[test]
fn test_other_driver_failures_are_reraised_unchanged() {
    let mut db = MockDriver::new();
    db.define_failing_procedure(ECHO, "ORA-00942: table or view does not exist");
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call.execute(&mut db, vec![]).unwrap_err();
    assert_eq!(
        err.driver_message(),
        Some("ORA-00942: table or view does not exist")
    );
}

#[test]
fn test_ref_cursor_out_decodes_into_a_result_set() {
    let mut db = MockDriver::new();
    let table = MockTable {
        columns: vec![("A".into(), "VARCHAR2".into())],
        rows: vec![
            vec![MockValue::Varchar("x".into())],
            vec![MockValue::Varchar("y".into())],
        ],
    };
    db.define_procedure("begin open :c for ...; end;", move |_| {
        Ok(vec![Some(MockValue::Cursor(table.clone()))])
    });
    let mut call = DbCall::prepare(&mut db, "begin open :c for ...; end;").unwrap();
    call.execute(&mut db, vec![BindSlot::Out(BindType::RefCursor)])
        .unwrap();
    let Value::Cursor(mut rs) = call.get(&mut db, 1).unwrap() else {
        panic!("expected a cursor value");
    };
    let rows = rs.all_rows().unwrap();
    assert_eq!(
        rows,
        vec![vec![Value::from("x")], vec![Value::from("y")]]
    );
}

#[test]
fn test_binding_a_non_null_ref_cursor_is_unsupported() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    let err = call
        .execute(
            &mut db,
            vec![BindSlot::InTyped(BindType::RefCursor, Value::from("x"))],
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}

#[test]
fn test_close_is_idempotent_and_blocks_further_execution() {
    let mut db = echo_driver();
    let mut call = DbCall::prepare(&mut db, ECHO).unwrap();
    assert!(call.is_open());
    call.close().unwrap();
    call.close().unwrap();
    assert!(!call.is_open());
    assert!(matches!(
        call.execute(&mut db, vec![]),
        Err(Error::InvalidUsage(_))
    ));
}
