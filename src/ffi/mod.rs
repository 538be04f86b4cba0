//! C FFI layer for the host hydrological model.
//!
//! This module exports C ABI functions. All functions are marked with
//! `#[no_mangle]` and use `extern "C"`.
//!
//! The actual logic is in the `chem` module. These functions are thin wrappers
//! that handle null checks, pointer safety, and C-to-Rust conversions.
//!
//! Status codes: `0` success, `1` rejected input, `-1` null pointer.

use std::ffi::CStr;
use std::os::raw::c_char;

pub mod compartment;
pub mod config;
pub mod lifecycle;
pub mod mass;
pub mod run;
pub mod simple;

pub use compartment::{owq_add_compartment, owq_species_index};
pub use config::owq_load_config_json;
pub use lifecycle::{
    owq_create, owq_create_with_options, owq_destroy, owq_get_step_count, owq_init_logging,
};
pub use mass::{owq_extract_region, owq_get_mass, owq_import_region, owq_set_mass};
pub use run::owq_run;
pub use simple::owq_abi_version;

pub const STATUS_OK: i32 = 0;
pub const STATUS_ERROR: i32 = 1;
pub const STATUS_NULL: i32 = -1;

/// Why a string argument could not be borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BadString {
    Null,
    NotUtf8,
}

impl BadString {
    /// Status code reported to the host for this argument.
    pub(crate) fn status(self) -> i32 {
        match self {
            BadString::Null => STATUS_NULL,
            BadString::NotUtf8 => STATUS_ERROR,
        }
    }
}

/// Borrow a C string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Result<&'a str, BadString> {
    if ptr.is_null() {
        return Err(BadString::Null);
    }
    CStr::from_ptr(ptr).to_str().map_err(|err| {
        log::error!("string argument is not valid UTF-8: {}", err);
        BadString::NotUtf8
    })
}
