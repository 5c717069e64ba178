use std::ffi::{CStr, c_int};
use std::fmt;

use libsqlite3_sys as ffi;
use thiserror::Error;

/// Errors surfaced by connections and statements.
///
/// This is the single chokepoint for both local argument validation and
/// engine status codes; nothing escapes the boundary as a raw code or a
/// panic. Engine-originated variants carry the engine's message, which
/// includes the offending SQL fragment or column where the engine provides
/// one.
#[derive(Debug, Error)]
pub enum Error {
    /// A host value outside the five storage classes was offered as a bind
    /// parameter.
    #[error("invalid argument type: {0}")]
    ArgumentType(String),

    /// An argument had the right type but the wrong shape, e.g. trailing
    /// content after a single SQL statement.
    #[error("invalid argument value: {0}")]
    ArgumentValue(String),

    /// Operation on a connection that has been closed.
    #[error("connection is closed")]
    ConnectionClosed,

    /// Operation on a statement that has been closed.
    #[error("statement is closed")]
    StatementClosed,

    /// The database file could not be opened.
    #[error("cannot open database {path:?}: {message}")]
    CannotOpen { path: String, message: String },

    /// The engine could not parse the SQL text.
    #[error("syntax error: {message}")]
    Syntax { message: String },

    /// A constraint rejected the operation.
    #[error("constraint violation ({kind}): {message}")]
    Constraint {
        kind: ConstraintKind,
        message: String,
    },

    /// Another writer holds the resource; retry is the caller's decision.
    #[error("database is busy: {message}")]
    Busy { message: String },

    /// An integer did not fit the engine's signed 64-bit storage class.
    #[error("integer out of range: {0}")]
    OutOfRange(String),

    /// A named bind parameter has no matching placeholder in the statement.
    #[error("unknown bind parameter: {name}")]
    UnknownParameter { name: String },

    /// Any engine status code outside the named taxonomy (I/O failure,
    /// corruption, ...), preserved verbatim.
    #[error("engine error {code}: {message}")]
    Engine { code: i32, message: String },
}

/// Subtype of a constraint violation, from the engine's extended result
/// codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    NotNull,
    Unique,
    PrimaryKey,
    ForeignKey,
    Check,
    RowId,
    Other,
}

impl ConstraintKind {
    pub(crate) fn from_code(code: c_int) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
            ffi::SQLITE_CONSTRAINT_UNIQUE => Self::Unique,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::PrimaryKey,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => Self::Check,
            ffi::SQLITE_CONSTRAINT_ROWID => Self::RowId,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotNull => "not null",
            Self::Unique => "unique",
            Self::PrimaryKey => "primary key",
            Self::ForeignKey => "foreign key",
            Self::Check => "check",
            Self::RowId => "rowid",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Map an engine status code plus its message into the taxonomy.
    ///
    /// Extended result codes are enabled on every connection, so `code` may
    /// carry subtype bits; the primary code selects the variant.
    pub(crate) fn from_engine(code: c_int, message: String) -> Self {
        match code & 0xff {
            ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => Error::Busy { message },
            ffi::SQLITE_CONSTRAINT => Error::Constraint {
                kind: ConstraintKind::from_code(code),
                message,
            },
            _ => Error::Engine { code, message },
        }
    }
}

/// Last error message recorded on a live connection handle.
pub(crate) fn engine_message(db: *mut ffi::sqlite3) -> String {
    let msg = unsafe { ffi::sqlite3_errmsg(db) };
    if msg.is_null() {
        String::from("unknown engine error")
    } else {
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }
}

/// Generic description of a status code, for failures with no connection to
/// interrogate.
pub(crate) fn code_message(code: c_int) -> String {
    let msg = unsafe { ffi::sqlite3_errstr(code) };
    if msg.is_null() {
        format!("engine error {code}")
    } else {
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }
}
