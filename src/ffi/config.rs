//! Loading the biogeochemistry configuration documents.

use std::os::raw::c_char;

use super::{c_str, STATUS_ERROR, STATUS_NULL, STATUS_OK};
use crate::chem::Engine;
use crate::config::BgcConfig;

/// Parses the model configuration and cycling-framework JSON documents and
/// makes them the engine's configuration. Cached bindings are dropped.
///
/// On a parse error the previous configuration stays in place.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
/// - both JSON arguments must be NUL-terminated strings
///
/// # Returns
/// 0 on success, 1 on a parse error or a string that is not UTF-8,
/// -1 on null pointers.
#[no_mangle]
pub unsafe extern "C" fn owq_load_config_json(
    ptr: *mut Engine,
    config_json: *const c_char,
    cycling_json: *const c_char,
) -> i32 {
    if ptr.is_null() {
        return STATUS_NULL;
    }
    let (config_json, cycling_json) = match (c_str(config_json), c_str(cycling_json)) {
        (Ok(config_json), Ok(cycling_json)) => (config_json, cycling_json),
        (Err(bad), _) | (_, Err(bad)) => return bad.status(),
    };

    match BgcConfig::from_json_strs(config_json, cycling_json) {
        Ok(config) => {
            (*ptr).set_config(config);
            STATUS_OK
        }
        Err(err) => {
            log::error!("owq_load_config_json: {}", err);
            STATUS_ERROR
        }
    }
}
