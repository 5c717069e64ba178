use sqlite_bridge::{Connection, ConstraintKind, Error, Value};

fn setup() -> Connection {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(a, b, c)").expect("create");
    conn
}

#[test]
fn positional_binding() {
    let mut conn = setup();
    let mut insert = conn
        .prepare("insert into t(a, b, c) values (?, ?, ?)")
        .expect("prepare");
    insert
        .run([
            Value::Integer(1),
            Value::Text("two".into()),
            Value::Real(3.0),
        ])
        .expect("run");

    let mut select = conn.prepare("select a, b, c from t").expect("prepare");
    let row = select.one(()).expect("select").expect("row");
    assert_eq!(
        row.values(),
        &[
            Value::Integer(1),
            Value::Text("two".into()),
            Value::Real(3.0)
        ]
    );
}

#[test]
fn named_binding_includes_sigil_in_key() {
    let mut conn = setup();
    let mut insert = conn
        .prepare("insert into t(a, b, c) values (:a, @b, $c)")
        .expect("prepare");
    insert
        .run([
            (":a", Value::Integer(10)),
            ("@b", Value::Integer(20)),
            ("$c", Value::Integer(30)),
        ])
        .expect("run");

    let mut select = conn.prepare("select a, b, c from t").expect("prepare");
    let row = select.one(()).expect("select").expect("row");
    assert_eq!(
        row.values(),
        &[Value::Integer(10), Value::Integer(20), Value::Integer(30)]
    );
}

#[test]
fn named_binding_by_first_occurrence_order_works_positionally() {
    let mut conn = setup();
    // Named placeholders also have positional ordinals, in first-occurrence
    // order.
    let mut insert = conn
        .prepare("insert into t(a, b) values (:first, :second)")
        .expect("prepare");
    insert
        .run([Value::Integer(1), Value::Integer(2)])
        .expect("positional bind onto named placeholders");

    let mut select = conn.prepare("select a, b from t").expect("prepare");
    let row = select.one(()).expect("select").expect("row");
    assert_eq!(row.values(), &[Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn unknown_named_parameter_fails() {
    let mut conn = setup();
    let mut insert = conn
        .prepare("insert into t(a) values (:a)")
        .expect("prepare");
    let err = insert.run([(":nope", Value::Integer(1))]).unwrap_err();
    match err {
        Error::UnknownParameter { name } => assert_eq!(name, ":nope"),
        other => panic!("expected UnknownParameter, got {other:?}"),
    }

    // The failure reset the statement; it stays usable.
    insert.run([(":a", Value::Integer(1))]).expect("reusable");
}

#[test]
fn omitted_params_leave_placeholders_null() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table strict_t(x not null)").expect("create");
    let mut insert = conn
        .prepare("insert into strict_t(x) values (?)")
        .expect("prepare");

    // Binding nothing leaves the placeholder NULL, which the not-null
    // constraint rejects at execution.
    let err = insert.run(()).unwrap_err();
    assert!(matches!(
        err,
        Error::Constraint {
            kind: ConstraintKind::NotNull,
            ..
        }
    ));
}

#[test]
fn statement_rebinds_fresh_each_execution() {
    let mut conn = setup();
    let mut insert = conn
        .prepare("insert into t(a, b) values (?, ?)")
        .expect("prepare");
    insert
        .run([Value::Integer(1), Value::Integer(2)])
        .expect("first");
    // Bindings are cleared between runs; only the first placeholder is
    // bound here, so the second lands NULL rather than a stale 2.
    insert.run([Value::Integer(3)]).expect("second");

    let mut select = conn
        .prepare("select a, b from t order by a")
        .expect("prepare");
    let rows = select.all(()).expect("select");
    assert_eq!(rows[1].values(), &[Value::Integer(3), Value::Null]);
}

#[test]
fn duplicate_column_names_resolve_to_last_occurrence() {
    let mut conn = Connection::open(":memory:").expect("open");
    let mut select = conn.prepare("select 1 as a, 2 as a").expect("prepare");
    let row = select.one(()).expect("select").expect("row");

    assert_eq!(row.column_names(), &["a".to_owned(), "a".to_owned()]);
    assert_eq!(row.get("a"), Some(&Value::Integer(2)));
    assert_eq!(row.get_by_index(0), Some(&Value::Integer(1)));
    assert_eq!(row.get_by_index(1), Some(&Value::Integer(2)));
}
