use std::collections::HashMap;
use std::ffi::{CStr, CString, c_int};
use std::fmt;
use std::slice;
use std::sync::Arc;

use libsqlite3_sys as ffi;

use crate::connection::{CLOSED_PLACEHOLDER, DbHandle};
use crate::error::{self, Error};
use crate::params::Params;
use crate::row::{Row, RunResult};
use crate::value::Value;

struct StmtInner {
    stmt: *mut ffi::sqlite3_stmt,
    db: Arc<DbHandle>,
}

// Same rationale as DbHandle: the pointer moves between threads but is only
// dereferenced through &mut Statement.
unsafe impl Send for StmtInner {}

impl Drop for StmtInner {
    fn drop(&mut self) {
        // Finalize re-reports the most recent evaluation error; since every
        // execution path resets first, anything non-OK here is noteworthy.
        let rc = unsafe { ffi::sqlite3_finalize(self.stmt) };
        if rc != ffi::SQLITE_OK {
            tracing::warn!(code = rc, "finalize reported an error");
        }
    }
}

/// One prepared statement, reusable across executions.
///
/// Created by [`Connection::prepare`](crate::Connection::prepare). The
/// statement owns its native handle plus a strong reference to the
/// connection's native context, so dropping connection and statements in any
/// order is sound; engine calls after either side closes fail with the
/// matching `*Closed` error instead.
///
/// Every execution binds the given parameters, steps the engine, and then
/// resets the native statement whether it succeeded or failed, so the
/// statement is always ready for the next call (a `Busy` failure can simply
/// be retried).
pub struct Statement {
    inner: Option<StmtInner>,
}

impl Statement {
    pub(crate) fn new(stmt: *mut ffi::sqlite3_stmt, db: Arc<DbHandle>) -> Self {
        Self {
            inner: Some(StmtInner { stmt, db }),
        }
    }

    fn engine_handles(&self) -> Result<(*mut ffi::sqlite3_stmt, &DbHandle), Error> {
        let inner = self.inner.as_ref().ok_or(Error::StatementClosed)?;
        if !inner.db.is_open() {
            return Err(Error::ConnectionClosed);
        }
        Ok((inner.stmt, &inner.db))
    }

    /// Whether this statement is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Execute to completion, discarding any produced rows.
    ///
    /// # Errors
    ///
    /// Returns the mapped engine error on failure; `Busy` when another
    /// writer holds the database, with the statement reset and reusable.
    pub fn run(&mut self, params: impl Into<Params>) -> Result<RunResult, Error> {
        let (stmt, db) = self.engine_handles()?;
        let out = bind_params(stmt, db, &params.into()).and_then(|()| step_to_done(stmt, db));
        reset(stmt);
        out
    }

    /// Execute and take at most the first row.
    ///
    /// # Errors
    ///
    /// Returns the mapped engine error on failure. An empty result set is
    /// `Ok(None)`, not an error.
    pub fn one(&mut self, params: impl Into<Params>) -> Result<Option<Row>, Error> {
        let (stmt, db) = self.engine_handles()?;
        let out = bind_params(stmt, db, &params.into()).and_then(|()| {
            match unsafe { ffi::sqlite3_step(stmt) } {
                ffi::SQLITE_ROW => {
                    let (names, cache) = column_meta(stmt);
                    read_row(stmt, &names, &cache).map(Some)
                }
                ffi::SQLITE_DONE => Ok(None),
                rc => Err(Error::from_engine(rc, error::engine_message(db.ptr()))),
            }
        });
        reset(stmt);
        out
    }

    /// Execute and collect every produced row, in order.
    ///
    /// # Errors
    ///
    /// Returns the mapped engine error on failure; a query producing zero
    /// rows is an empty vector.
    pub fn all(&mut self, params: impl Into<Params>) -> Result<Vec<Row>, Error> {
        let (stmt, db) = self.engine_handles()?;
        let out = bind_params(stmt, db, &params.into()).and_then(|()| {
            let (names, cache) = column_meta(stmt);
            let mut rows = Vec::new();
            loop {
                match unsafe { ffi::sqlite3_step(stmt) } {
                    ffi::SQLITE_ROW => {
                        rows.push(read_row(stmt, &names, &cache)?);
                    }
                    ffi::SQLITE_DONE => break Ok(rows),
                    rc => break Err(Error::from_engine(rc, error::engine_message(db.ptr()))),
                }
            }
        });
        reset(stmt);
        out
    }

    /// Close the statement, releasing its native handle. Idempotent.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::trace!("closed statement");
        }
    }

    /// Original SQL text of the statement, placeholders included.
    ///
    /// Still readable after the connection closes; returns the `"#CLOSED"`
    /// placeholder once the statement itself is closed.
    #[must_use]
    pub fn sql(&self) -> String {
        match &self.inner {
            Some(inner) => {
                let sql = unsafe { ffi::sqlite3_sql(inner.stmt) };
                if sql.is_null() {
                    String::new()
                } else {
                    unsafe { CStr::from_ptr(sql) }.to_string_lossy().into_owned()
                }
            }
            None => CLOSED_PLACEHOLDER.to_owned(),
        }
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Statement({})", self.sql())
    }
}

fn as_c_int(n: usize) -> c_int {
    c_int::try_from(n).unwrap_or(c_int::MAX)
}

/// Reset the native statement and clear its bindings so the next execution
/// starts fresh. The return value of `sqlite3_reset` re-reports the last
/// step error rather than describing the reset, so it is ignored.
fn reset(stmt: *mut ffi::sqlite3_stmt) {
    unsafe {
        ffi::sqlite3_reset(stmt);
        ffi::sqlite3_clear_bindings(stmt);
    }
}

fn bind_params(
    stmt: *mut ffi::sqlite3_stmt,
    db: &DbHandle,
    params: &Params,
) -> Result<(), Error> {
    match params {
        Params::None => Ok(()),
        Params::Positional(values) => {
            for (i, value) in values.iter().enumerate() {
                bind_one(stmt, db, as_c_int(i + 1), value)?;
            }
            Ok(())
        }
        Params::Named(pairs) => {
            for (name, value) in pairs {
                let c_name = CString::new(name.as_str()).map_err(|_| Error::UnknownParameter {
                    name: name.clone(),
                })?;
                let idx = unsafe { ffi::sqlite3_bind_parameter_index(stmt, c_name.as_ptr()) };
                if idx == 0 {
                    return Err(Error::UnknownParameter { name: name.clone() });
                }
                bind_one(stmt, db, idx, value)?;
            }
            Ok(())
        }
    }
}

fn bind_one(
    stmt: *mut ffi::sqlite3_stmt,
    db: &DbHandle,
    idx: c_int,
    value: &Value,
) -> Result<(), Error> {
    let rc = match value {
        Value::Null => unsafe { ffi::sqlite3_bind_null(stmt, idx) },
        Value::Integer(i) => unsafe { ffi::sqlite3_bind_int64(stmt, idx, *i) },
        Value::Real(f) => unsafe { ffi::sqlite3_bind_double(stmt, idx, *f) },
        Value::Text(s) => unsafe {
            ffi::sqlite3_bind_text(
                stmt,
                idx,
                s.as_ptr().cast(),
                as_c_int(s.len()),
                ffi::SQLITE_TRANSIENT(),
            )
        },
        Value::Blob(b) if b.is_empty() => unsafe { ffi::sqlite3_bind_zeroblob(stmt, idx, 0) },
        Value::Blob(b) => unsafe {
            ffi::sqlite3_bind_blob(
                stmt,
                idx,
                b.as_ptr().cast(),
                as_c_int(b.len()),
                ffi::SQLITE_TRANSIENT(),
            )
        },
    };
    if rc != ffi::SQLITE_OK {
        return Err(Error::from_engine(rc, error::engine_message(db.ptr())));
    }
    Ok(())
}

fn step_to_done(stmt: *mut ffi::sqlite3_stmt, db: &DbHandle) -> Result<RunResult, Error> {
    loop {
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => {}
            ffi::SQLITE_DONE => break,
            rc => return Err(Error::from_engine(rc, error::engine_message(db.ptr()))),
        }
    }
    Ok(RunResult {
        changes: unsafe { ffi::sqlite3_changes64(db.ptr()) } as u64,
        last_insert_rowid: unsafe { ffi::sqlite3_last_insert_rowid(db.ptr()) },
    })
}

/// Column names in declaration order plus the name-to-index cache shared by
/// every row of a result set. Duplicate names resolve to their last
/// occurrence in the cache.
fn column_meta(
    stmt: *mut ffi::sqlite3_stmt,
) -> (Arc<Vec<String>>, Arc<HashMap<String, usize>>) {
    let count = unsafe { ffi::sqlite3_column_count(stmt) } as usize;
    let mut names = Vec::with_capacity(count);
    for i in 0..count {
        let name = unsafe { ffi::sqlite3_column_name(stmt, as_c_int(i)) };
        if name.is_null() {
            names.push(format!("column{i}"));
        } else {
            names.push(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned());
        }
    }
    let cache = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect::<HashMap<_, _>>();
    (Arc::new(names), Arc::new(cache))
}

fn read_row(
    stmt: *mut ffi::sqlite3_stmt,
    names: &Arc<Vec<String>>,
    cache: &Arc<HashMap<String, usize>>,
) -> Result<Row, Error> {
    let mut values = Vec::with_capacity(names.len());
    for i in 0..names.len() {
        values.push(column_value(stmt, as_c_int(i)));
    }
    Ok(Row::from_parts(Arc::clone(names), Arc::clone(cache), values))
}

/// Read one result column as a [`Value`], the mirror of the bind mapping.
///
/// Integer columns come back through the 64-bit accessor so full magnitude
/// survives; TEXT holding invalid UTF-8 (possible in a hand-corrupted file)
/// is recovered lossily rather than failing the whole row, blob columns
/// being the supported path for raw bytes.
fn column_value(stmt: *mut ffi::sqlite3_stmt, idx: c_int) -> Value {
    match unsafe { ffi::sqlite3_column_type(stmt, idx) } {
        ffi::SQLITE_INTEGER => Value::Integer(unsafe { ffi::sqlite3_column_int64(stmt, idx) }),
        ffi::SQLITE_FLOAT => Value::Real(unsafe { ffi::sqlite3_column_double(stmt, idx) }),
        ffi::SQLITE_TEXT => {
            let ptr = unsafe { ffi::sqlite3_column_text(stmt, idx) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, idx) } as usize;
            if ptr.is_null() {
                Value::Text(String::new())
            } else {
                let bytes = unsafe { slice::from_raw_parts(ptr, len) };
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
        ffi::SQLITE_BLOB => {
            let ptr = unsafe { ffi::sqlite3_column_blob(stmt, idx) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, idx) } as usize;
            if ptr.is_null() {
                Value::Blob(Vec::new())
            } else {
                let bytes = unsafe { slice::from_raw_parts(ptr.cast::<u8>(), len) };
                Value::Blob(bytes.to_vec())
            }
        }
        _ => Value::Null,
    }
}
