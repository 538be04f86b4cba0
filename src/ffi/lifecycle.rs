//! Engine creation, destruction, and step-count queries.

use std::os::raw::c_char;

use super::c_str;
use crate::chem::Engine;
use crate::config::{EngineOptions, NonFinitePolicy};
use crate::error::EngineError;

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`
/// (default filter `info`). Calling it again does nothing.
#[no_mangle]
pub extern "C" fn owq_init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Creates a new engine and returns an opaque pointer.
///
/// `num_threads` of 0 means one worker. A non-zero `abort_on_non_finite`
/// makes a NaN or infinite transfer fail its transformation instead of
/// skipping the offending cells.
///
/// # Returns
/// A pointer to a new Engine, or null if the worker pool cannot be built.
///
/// # Safety
/// The returned pointer must eventually be freed with `owq_destroy()`.
#[no_mangle]
pub extern "C" fn owq_create(num_threads: u32, abort_on_non_finite: u8) -> *mut Engine {
    let options = EngineOptions {
        num_threads: num_threads as usize,
        non_finite: if abort_on_non_finite != 0 {
            NonFinitePolicy::Abort
        } else {
            NonFinitePolicy::Skip
        },
        ..Default::default()
    };

    into_raw(Engine::new(options), "owq_create")
}

/// Creates a new engine from a JSON options document, e.g.
/// `{"num_threads": 4, "non_finite": "abort", "cache_bindings": false}`.
/// Missing keys take their defaults.
///
/// # Safety
/// - `options_json` must be a NUL-terminated string, or null
/// - the returned pointer must eventually be freed with `owq_destroy()`
///
/// # Returns
/// A pointer to a new Engine, or null if the document is null, not UTF-8,
/// not valid options, or the worker pool cannot be built.
#[no_mangle]
pub unsafe extern "C" fn owq_create_with_options(options_json: *const c_char) -> *mut Engine {
    let Ok(options_json) = c_str(options_json) else {
        return std::ptr::null_mut();
    };
    let engine = EngineOptions::from_json_str(options_json).and_then(Engine::new);
    into_raw(engine, "owq_create_with_options")
}

fn into_raw(engine: Result<Engine, EngineError>, caller: &str) -> *mut Engine {
    match engine {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(err) => {
            log::error!("{}: {}", caller, err);
            std::ptr::null_mut()
        }
    }
}

/// Destroys an engine and frees its memory.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `owq_create()`, or null
/// - `ptr` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn owq_destroy(ptr: *mut Engine) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Number of completed `owq_run` calls.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
///
/// # Returns
/// The step count, or 0 if ptr is null.
#[no_mangle]
pub unsafe extern "C" fn owq_get_step_count(ptr: *const Engine) -> u64 {
    if ptr.is_null() {
        return 0;
    }
    (*ptr).step_count()
}
