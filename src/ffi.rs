//! FFI bindings for Jiwa
//!
//! This module provides C-compatible functions for calling the scoring pipeline
//! from other languages. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `jiwa_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::intake::{parse_snapshot, validate_snapshot};
use crate::pipeline::{snapshot_to_assessment_json, RelapsePredictor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Assess a snapshot JSON document with the default configuration.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `jiwa_free_string`.
/// - Returns NULL on error; call `jiwa_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn jiwa_assess(snapshot_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    match snapshot_to_assessment_json(json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Check a snapshot JSON document for implausible values.
///
/// Returns a JSON array of issues (`[]` when the snapshot is clean).
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `jiwa_free_string`.
/// - Returns NULL if the document cannot be parsed.
#[no_mangle]
pub unsafe extern "C" fn jiwa_validate(snapshot_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    let snapshot = match parse_snapshot(&json_str) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&validate_snapshot(&snapshot)) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Configured Predictor API
// ============================================================================

/// Opaque handle to a RelapsePredictor
pub struct RelapsePredictorHandle {
    predictor: RelapsePredictor,
}

/// Create a predictor from a JSON configuration document.
///
/// # Safety
/// - `config_json` may be NULL to use the baseline configuration; otherwise it
///   must be a valid null-terminated C string.
/// - Must be freed with `jiwa_predictor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn jiwa_predictor_new(
    config_json: *const c_char,
) -> *mut RelapsePredictorHandle {
    clear_last_error();

    let predictor = if config_json.is_null() {
        RelapsePredictor::new()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string");
                return ptr::null_mut();
            }
        };
        match RelapsePredictor::from_config_json(&json_str) {
            Ok(predictor) => predictor,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(RelapsePredictorHandle { predictor }))
}

/// Free a predictor.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `jiwa_predictor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn jiwa_predictor_free(predictor: *mut RelapsePredictorHandle) {
    if !predictor.is_null() {
        drop(Box::from_raw(predictor));
    }
}

/// Assess a snapshot with a configured predictor.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `jiwa_predictor_new`.
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `jiwa_free_string`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn jiwa_predictor_assess(
    predictor: *const RelapsePredictorHandle,
    snapshot_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return ptr::null_mut();
    }

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*predictor;
    match handle.predictor.assess_json(&json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management & Errors
// ============================================================================

/// Free a string returned by any Jiwa function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a Jiwa function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn jiwa_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local string, valid until the next Jiwa call
///   on the same thread. Do NOT free this pointer.
/// - Returns NULL if there was no error.
#[no_mangle]
pub unsafe extern "C" fn jiwa_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn jiwa_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
