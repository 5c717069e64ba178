use sqlite_bridge::{Connection, ConstraintKind, Error, Value};
use tempfile::tempdir;

#[test]
fn changes_reports_rows_affected() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(y integer)").expect("create");
    conn.exec(
        "insert into t values (1); insert into t values (2); insert into t values (3); \
         insert into t values (4); insert into t values (5)",
    )
    .expect("seed");

    let mut update = conn
        .prepare("update t set y = -1 where y % 2 = 0")
        .expect("prepare");
    let result = update.run(()).expect("update");
    assert_eq!(result.changes, 2);
}

#[test]
fn last_insert_rowid_tracks_rowid_alias() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(id integer primary key, v text)")
        .expect("create");

    let mut insert = conn
        .prepare("insert into t(id, v) values (?, ?)")
        .expect("prepare");
    let result = insert
        .run([Value::Integer(1234), Value::Text("x".into())])
        .expect("insert");
    assert_eq!(result.last_insert_rowid, 1234);
    assert_eq!(result.changes, 1);
}

#[test]
fn one_on_empty_result_set_is_none() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(x)").expect("create");
    let mut select = conn.prepare("select x from t").expect("prepare");
    assert!(select.one(()).expect("select").is_none());
}

#[test]
fn all_collects_rows_in_order() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(x)").expect("create");
    conn.exec("insert into t values (3); insert into t values (1); insert into t values (2)")
        .expect("seed");

    let mut select = conn.prepare("select x from t order by x").expect("prepare");
    let rows = select.all(()).expect("select");
    let xs: Vec<_> = rows
        .iter()
        .map(|r| r.get("x").cloned().expect("column x"))
        .collect();
    assert_eq!(
        xs,
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );

    // Empty result sets come back as an empty vector.
    let mut none = conn
        .prepare("select x from t where x > 100")
        .expect("prepare");
    assert!(none.all(()).expect("select").is_empty());
}

#[test]
fn run_discards_rows_and_stays_reusable() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(x)").expect("create");
    conn.exec("insert into t values (1); insert into t values (2)")
        .expect("seed");

    let mut select = conn.prepare("select x from t").expect("prepare");
    select.run(()).expect("rows discarded");
    let rows = select.all(()).expect("still usable");
    assert_eq!(rows.len(), 2);
}

#[test]
fn statement_reusable_after_constraint_failure() {
    let mut conn = Connection::open(":memory:").expect("open");
    conn.exec("create table t(x unique)").expect("create");

    let mut insert = conn.prepare("insert into t values (?)").expect("prepare");
    insert.run([Value::Integer(1)]).expect("first insert");

    let err = insert.run([Value::Integer(1)]).unwrap_err();
    assert!(matches!(
        err,
        Error::Constraint {
            kind: ConstraintKind::Unique,
            ..
        }
    ));

    // The automatic reset restored reusability without masking the error.
    insert.run([Value::Integer(2)]).expect("next insert");
}

#[test]
fn conflicting_writer_fails_busy_and_both_stay_usable() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("shared.db");
    let path = path.to_str().expect("utf8 path");

    let mut a = Connection::open(path).expect("open a");
    let mut b = Connection::open(path).expect("open b");

    a.exec("create table t(x)").expect("create");
    a.exec("begin immediate").expect("a takes the write lock");
    a.exec("insert into t values (1)").expect("a inserts");

    // No busy timeout is configured; contention fails fast.
    let mut b_insert = b.prepare("insert into t values (2)").expect("prepare");
    let err = b_insert.run(()).unwrap_err();
    assert!(matches!(err, Error::Busy { .. }), "got {err:?}");

    a.exec("commit").expect("a commits");

    // B's statement was reset and works once the lock is gone; A's
    // transaction data is intact.
    b_insert.run(()).expect("retry succeeds");
    let mut count = a.prepare("select count(*) from t").expect("prepare");
    let row = count.one(()).expect("count").expect("row");
    assert_eq!(row.get_by_index(0), Some(&Value::Integer(2)));
}
