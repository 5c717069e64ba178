use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use libsqlite3_sys as ffi;

use crate::engine;
use crate::error::{self, Error};
use crate::statement::Statement;

/// Placeholder returned by accessors after close; non-authoritative,
/// documented as such, never an error.
pub(crate) const CLOSED_PLACEHOLDER: &str = "#CLOSED";

/// Shared owner of one native database context.
///
/// The context is released exactly when the last strong reference drops,
/// i.e. once the connection is closed or dropped *and* every statement
/// prepared from it is closed or dropped, in whichever order. The `open`
/// flag is cleared by [`Connection::close`] so that statements refuse
/// engine calls afterwards instead of executing against a connection the
/// caller considers gone.
pub(crate) struct DbHandle {
    db: *mut ffi::sqlite3,
    open: AtomicBool,
}

// The bundled engine is compiled in serialized threading mode; the handle
// may move between threads, and the pointer itself is only dereferenced
// through &mut Connection / &mut Statement.
unsafe impl Send for DbHandle {}
unsafe impl Sync for DbHandle {}

impl DbHandle {
    pub(crate) fn ptr(&self) -> *mut ffi::sqlite3 {
        self.db
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Drop for DbHandle {
    fn drop(&mut self) {
        // No statements remain at this point (they each held a strong
        // reference), so the engine has nothing to object to.
        let rc = unsafe { ffi::sqlite3_close(self.db) };
        if rc != ffi::SQLITE_OK {
            tracing::error!(code = rc, "failed to close database context");
        }
    }
}

/// One open database.
///
/// Opened by [`Connection::open`], closed by [`Connection::close`] or by
/// drop. Closing is idempotent, and statements prepared from this
/// connection stay structurally valid across it: their engine calls fail
/// with [`Error::ConnectionClosed`] rather than crashing, and the native
/// context itself lives until the last of {connection, statements} goes
/// away.
///
/// All operations are synchronous and run on the calling thread. A
/// connection can move between threads but must be externally synchronized
/// if shared.
pub struct Connection {
    inner: Option<Arc<DbHandle>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Connection {
    /// Open a database.
    ///
    /// Recognized forms of `uri`: `":memory:"` for a transient in-memory
    /// database, `""` for a transient file-backed database in a temporary
    /// location deleted on clean close, and any other string for a
    /// filesystem path opened read-write and created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotOpen`] if the path is unusable (permissions,
    /// missing parent directory, interior NUL byte, ...).
    pub fn open(uri: &str) -> Result<Self, Error> {
        engine::initialize();

        let c_uri = CString::new(uri).map_err(|_| Error::CannotOpen {
            path: uri.to_owned(),
            message: "path contains an interior NUL byte".into(),
        })?;

        let mut db = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_open_v2(
                c_uri.as_ptr(),
                &mut db,
                ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE,
                ptr::null(),
            )
        };
        if rc != ffi::SQLITE_OK {
            // A handle may be allocated even on failure and must be closed.
            let message = if db.is_null() {
                error::code_message(rc)
            } else {
                let m = error::engine_message(db);
                unsafe { ffi::sqlite3_close(db) };
                m
            };
            return Err(Error::CannotOpen {
                path: uri.to_owned(),
                message,
            });
        }

        // Extended result codes carry the constraint subtypes the error
        // taxonomy reports.
        let rc = unsafe { ffi::sqlite3_extended_result_codes(db, 1) };
        if rc != ffi::SQLITE_OK {
            let message = error::engine_message(db);
            unsafe { ffi::sqlite3_close(db) };
            return Err(Error::CannotOpen {
                path: uri.to_owned(),
                message,
            });
        }

        tracing::trace!(uri, "opened database");

        Ok(Self {
            inner: Some(Arc::new(DbHandle {
                db,
                open: AtomicBool::new(true),
            })),
            _not_sync: PhantomData,
        })
    }

    fn handle(&self) -> Result<&Arc<DbHandle>, Error> {
        self.inner.as_ref().ok_or(Error::ConnectionClosed)
    }

    /// Whether this connection is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Close the connection. Idempotent; never fails.
    ///
    /// Live statements keep the native context alive; they refuse further
    /// engine calls but close cleanly whenever the caller (or drop) gets
    /// to them.
    pub fn close(&mut self) {
        if let Some(handle) = self.inner.take() {
            handle.open.store(false, Ordering::Release);
            tracing::trace!("closed connection");
        }
    }

    /// Execute one or more `;`-separated statements, discarding any rows.
    ///
    /// No parameter binding. A failure partway through surfaces that
    /// statement's error; whatever ran before it stays applied, per the
    /// engine's own atomicity rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close,
    /// [`Error::ArgumentValue`] for SQL with an interior NUL byte, and the
    /// mapped engine error for syntax or constraint failures.
    pub fn exec(&mut self, sql: &str) -> Result<(), Error> {
        let handle = self.handle()?;
        let c_sql = CString::new(sql)
            .map_err(|_| Error::ArgumentValue("sql contains an interior NUL byte".into()))?;

        let mut errmsg = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_exec(
                handle.ptr(),
                c_sql.as_ptr(),
                None,
                ptr::null_mut(),
                &mut errmsg,
            )
        };
        if rc != ffi::SQLITE_OK {
            let message = if errmsg.is_null() {
                error::code_message(rc)
            } else {
                let m = unsafe { CStr::from_ptr(errmsg) }.to_string_lossy().into_owned();
                unsafe { ffi::sqlite3_free(errmsg.cast()) };
                m
            };
            return Err(Error::from_engine(rc, message));
        }
        Ok(())
    }

    /// Prepare exactly one statement.
    ///
    /// A single trailing `;` is consumed; any further content after the
    /// statement, whitespace included, is rejected. The returned statement
    /// holds its own reference to the native context and survives this
    /// connection closing (its engine calls then fail, cleanly).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close, [`Error::Syntax`]
    /// when the engine cannot parse the text, and [`Error::ArgumentValue`]
    /// for input containing no statement or trailing content after one.
    pub fn prepare(&mut self, sql: &str) -> Result<Statement, Error> {
        let handle = self.handle()?;
        let c_sql = CString::new(sql)
            .map_err(|_| Error::ArgumentValue("sql contains an interior NUL byte".into()))?;

        let mut stmt = ptr::null_mut();
        let mut tail = ptr::null();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(handle.ptr(), c_sql.as_ptr(), -1, &mut stmt, &mut tail)
        };
        if rc != ffi::SQLITE_OK {
            let message = error::engine_message(handle.ptr());
            return Err(match rc & 0xff {
                ffi::SQLITE_ERROR => Error::Syntax { message },
                _ => Error::from_engine(rc, message),
            });
        }

        // Empty or comment-only input parses to no statement at all.
        if stmt.is_null() {
            return Err(Error::ArgumentValue("sql contains no statement".into()));
        }

        let consumed = unsafe { tail.offset_from(c_sql.as_ptr()) } as usize;
        if consumed < sql.len() {
            unsafe { ffi::sqlite3_finalize(stmt) };
            let trailing = sql.get(consumed..).unwrap_or("");
            return Err(Error::ArgumentValue(format!(
                "trailing content after SQL statement: {trailing:?}"
            )));
        }

        Ok(Statement::new(stmt, Arc::clone(handle)))
    }

    /// Absolute path of the database file.
    ///
    /// Empty for in-memory and temporary databases. After close this
    /// returns the `"#CLOSED"` placeholder, never an error.
    #[must_use]
    pub fn db_filename(&self) -> String {
        match &self.inner {
            Some(handle) => {
                let name = unsafe { ffi::sqlite3_db_filename(handle.ptr(), c"main".as_ptr()) };
                if name.is_null() {
                    String::new()
                } else {
                    unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
                }
            }
            None => CLOSED_PLACEHOLDER.to_owned(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_none() {
            return write!(f, "Database(<closed>)");
        }
        let name = self.db_filename();
        if name.is_empty() {
            write!(f, "Database(<temporary>)")
        } else {
            write!(f, "Database({name})")
        }
    }
}
