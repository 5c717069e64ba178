use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::Once;

use libsqlite3_sys as ffi;

static INIT: Once = Once::new();

/// One-time, process-wide engine initialization.
///
/// Installs the engine's global log callback (forwarded to `tracing`) and
/// then runs the engine's own initialization. Idempotent;
/// [`Connection::open`](crate::Connection::open) invokes it, but embedders
/// that configure the engine themselves may call it earlier.
pub fn initialize() {
    INIT.call_once(|| {
        // Configuration is only accepted before sqlite3_initialize has run
        // anywhere in the process; a refusal here means some other component
        // got there first, which is harmless beyond losing the log hook.
        let rc = unsafe {
            ffi::sqlite3_config(
                ffi::SQLITE_CONFIG_LOG,
                engine_log as extern "C" fn(*mut c_void, c_int, *const c_char),
                ptr::null_mut::<c_void>(),
            )
        };
        if rc != ffi::SQLITE_OK {
            tracing::debug!(code = rc, "engine log hook not installed");
        }

        let rc = unsafe { ffi::sqlite3_initialize() };
        if rc != ffi::SQLITE_OK {
            tracing::error!(code = rc, "engine initialization failed");
        }
    });
}

/// Version string of the linked engine, e.g. `"3.46.0"`.
#[must_use]
pub fn version() -> &'static str {
    let v = unsafe { CStr::from_ptr(ffi::sqlite3_libversion()) };
    v.to_str().unwrap_or("unknown")
}

extern "C" fn engine_log(_arg: *mut c_void, code: c_int, msg: *const c_char) {
    if msg.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
    tracing::warn!(code, "engine: {message}");
}
