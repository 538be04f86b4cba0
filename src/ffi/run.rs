//! Running the biogeochemistry stage for one host time step.

use crate::chem::Engine;

/// Applies every configured transformation once, in every compartment.
///
/// Failed transformations are logged at error level and skipped; the rest of
/// the run continues.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
///
/// # Returns
/// The number of failed transformations (0 when all succeeded), or -1 on a
/// null pointer.
#[no_mangle]
pub unsafe extern "C" fn owq_run(ptr: *mut Engine) -> i32 {
    if ptr.is_null() {
        return -1;
    }

    let report = (*ptr).run();
    i32::try_from(report.failures.len()).unwrap_or(i32::MAX)
}
