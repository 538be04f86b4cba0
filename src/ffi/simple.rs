//! ABI version query.

/// Bumped whenever an exported signature changes.
pub const ABI_VERSION: u32 = 1;

/// Lets the host check it was built against a compatible library.
#[no_mangle]
pub extern "C" fn owq_abi_version() -> u32 {
    ABI_VERSION
}
