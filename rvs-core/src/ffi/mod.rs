//! FFI (Foreign Function Interface) for RVS Core
//!
//! This module provides a C-compatible API over the process-wide tracer,
//! for runtimes and instrumentation written in other languages.
//!
//! ## Lifecycle
//!
//! Call `rvs_trace_init` once at startup. Every other control function is
//! a no-op until then; `rvs_trace_download` returns 0.
//!
//! ## Record Layout
//!
//! `RvsEntry` is `{ uint32_t id; uint32_t timestamp; }`, 8 bytes, no padding.
//! `rvs_trace_download` takes the destination size in bytes.
//!
//! ## Error Handling
//!
//! - Functions returning an integer return `-errno` on failure.
//! - Use `rvs_get_last_error` to retrieve the error message.
//! - Error messages are thread-local.
//! - The ipoint functions never fail and never set an error.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use crate::clock::NO_PROCESSOR;
use crate::config::TraceConfig;
use crate::error::RVSError;
use crate::global;
use crate::trace::{validate_destination, SessionState, TraceEntry};

/// C view of a trace entry
pub type RvsEntry = TraceEntry;

/// C view of tracer statistics
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RvsStats {
    pub capacity: u64,
    pub recorded: u64,
    pub missed: u64,
    pub downloaded: u64,
    /// 0 idle, 1 running, 2 stopped
    pub state: u32,
    /// Processor being recorded, `UINT32_MAX` if none
    pub target: u32,
    /// Non-zero once overflow is imminent
    pub overflow_imminent: u32,
}

// Thread-local storage for error messages
thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

/// Clear the last error
fn clear_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Record `err` as the last error and return `-errno`
fn fail(context: &str, err: RVSError) -> i32 {
    let errno = err.errno();
    set_error(format!("{}: {}", context, err));
    -errno
}

// ============================================================================
// String Helpers
// ============================================================================

/// Get the last error message.
///
/// Returns null if no error occurred.
/// The returned string must be freed with `rvs_free_string`.
#[no_mangle]
pub extern "C" fn rvs_get_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(msg) => CString::new(msg.as_str())
            .map(|s| s.into_raw())
            .unwrap_or(ptr::null_mut()),
        None => ptr::null_mut(),
    })
}

/// Free a string returned by this API.
#[no_mangle]
pub extern "C" fn rvs_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

// ============================================================================
// Session Control
// ============================================================================

/// Construct the process-wide tracer.
///
/// `target` is a processor id, or -1 to record whichever processor calls
/// `rvs_trace_start`. `capacity` is in entries; 0 selects the default.
/// Returns 0 on success, `-EBUSY` if already initialized, `-EINVAL` on a
/// bad argument.
#[no_mangle]
pub extern "C" fn rvs_trace_init(target: i32, capacity: usize) -> i32 {
    clear_error();

    let mut config = TraceConfig::new();
    match target {
        -1 => config = config.with_caller_target(),
        id if id >= 0 => config = config.with_target_processor(id as u32),
        other => {
            let err = RVSError::InvalidConfig {
                reason: format!("target must be a processor id or -1, got {}", other),
            };
            return fail("Failed to initialize tracer", err);
        }
    }
    if capacity != 0 {
        config = config.with_capacity(capacity);
    }

    match global::install(config) {
        Ok(_) => 0,
        Err(e) => fail("Failed to initialize tracer", e),
    }
}

/// Discard all entries and disarm.
#[no_mangle]
pub extern "C" fn rvs_trace_reset() {
    global::reset();
}

/// Arm recording.
#[no_mangle]
pub extern "C" fn rvs_trace_start() {
    global::start();
}

/// Disarm recording, keeping entries.
#[no_mangle]
pub extern "C" fn rvs_trace_stop() {
    global::stop();
}

// ============================================================================
// Ipoints
// ============================================================================

/// Record an ipoint.
#[no_mangle]
pub extern "C" fn rvs_trace_ipoint(id: u32) {
    global::ipoint(id);
}

/// Record an ipoint; returns 1 if overflow is imminent, else 0.
#[no_mangle]
pub extern "C" fn rvs_trace_ipoint_checked(id: u32) -> i32 {
    global::ipoint_checked(id) as i32
}

// ============================================================================
// Export
// ============================================================================

/// Copy recorded entries into `destination` (`size` bytes).
///
/// Returns the number of entries copied, or `-EFAULT` / `-EINVAL` if the
/// destination is null, out of the address space or misaligned.
///
/// # Safety
///
/// A non-null, aligned `destination` must be valid for writes of `size`
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn rvs_trace_download(destination: *mut RvsEntry, size: usize) -> isize {
    clear_error();

    let room = match validate_destination(destination, size) {
        Ok(room) => room,
        Err(e) => return fail("Failed to download trace", e) as isize,
    };

    match global::tracer() {
        Some(tracer) => tracer.download_validated(destination, room) as isize,
        None => 0,
    }
}

/// Fill `stats` with the current tracer statistics.
///
/// Returns 0 on success, `-EFAULT` for a null pointer, `-ENODEV` before
/// `rvs_trace_init`.
///
/// # Safety
///
/// A non-null `stats` must point to a writable `RvsStats`.
#[no_mangle]
pub unsafe extern "C" fn rvs_trace_get_stats(stats: *mut RvsStats) -> i32 {
    clear_error();

    let out = match stats.as_mut() {
        Some(out) => out,
        None => {
            let err = RVSError::InvalidDestination {
                reason: "null stats pointer".to_string(),
            };
            return fail("Failed to read stats", err);
        }
    };

    let snapshot = match global::installed() {
        Ok(tracer) => tracer.stats(),
        Err(e) => return fail("Failed to read stats", e),
    };

    *out = RvsStats {
        capacity: snapshot.capacity as u64,
        recorded: snapshot.recorded as u64,
        missed: snapshot.missed,
        downloaded: snapshot.downloaded,
        state: match snapshot.state {
            SessionState::Idle => 0,
            SessionState::Running => 1,
            SessionState::Stopped => 2,
        },
        target: snapshot.target.unwrap_or(NO_PROCESSOR),
        overflow_imminent: snapshot.overflow_imminent as u32,
    };
    0
}

// ============================================================================
// Version Info
// ============================================================================

/// Get the RVS core version.
///
/// Returns a static string (do not free).
#[no_mangle]
pub extern "C" fn rvs_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Get the C ABI version.
#[no_mangle]
pub extern "C" fn rvs_api_version() -> u32 {
    crate::API_VERSION
}
