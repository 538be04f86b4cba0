//! Cell and region mass exchange with the host.

use super::{STATUS_ERROR, STATUS_NULL, STATUS_OK};
use crate::chem::{extract_region, import_region, Engine, RegionBounds};

/// Sets one cell's mass (grams) of a species.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
///
/// # Returns
/// 0 on success, 1 for an unknown compartment or species or out-of-bounds
/// coordinates, -1 on a null pointer.
#[no_mangle]
pub unsafe extern "C" fn owq_set_mass(
    ptr: *mut Engine,
    compartment: u32,
    species: u32,
    x: u32,
    y: u32,
    z: u32,
    value: f64,
) -> i32 {
    if ptr.is_null() {
        return STATUS_NULL;
    }

    let Some(state) = (*ptr).compartment_mut(compartment as usize) else {
        return STATUS_ERROR;
    };
    if state
        .mass
        .set(species as usize, x as usize, y as usize, z as usize, value)
    {
        STATUS_OK
    } else {
        STATUS_ERROR
    }
}

/// Gets one cell's mass (grams) of a species.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
///
/// # Returns
/// The mass, or 0.0 for a null pointer, unknown compartment or species, or
/// out-of-bounds coordinates.
#[no_mangle]
pub unsafe extern "C" fn owq_get_mass(
    ptr: *const Engine,
    compartment: u32,
    species: u32,
    x: u32,
    y: u32,
    z: u32,
) -> f64 {
    if ptr.is_null() {
        return 0.0;
    }

    (*ptr)
        .compartment(compartment as usize)
        .map(|state| {
            state
                .mass
                .get(species as usize, x as usize, y as usize, z as usize)
        })
        .unwrap_or(0.0)
}

/// Extracts a box `[min, max)` of one species' masses into a flat buffer.
///
/// # Layout
/// The buffer is filled in z,y,x order (z changes slowest, x changes fastest).
/// This matches the layout expected by `owq_import_region`. Coordinates are
/// clamped to the compartment grid.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
/// - `out_buf` must point to at least `out_len` doubles
///
/// # Returns
/// Number of values written, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn owq_extract_region(
    ptr: *const Engine,
    compartment: u32,
    species: u32,
    out_buf: *mut f64,
    out_len: usize,
    min_x: i32,
    min_y: i32,
    min_z: i32,
    max_x: i32,
    max_y: i32,
    max_z: i32,
) -> u64 {
    if ptr.is_null() || out_buf.is_null() {
        return 0;
    }
    let Some(state) = (*ptr).compartment(compartment as usize) else {
        return 0;
    };

    let bounds = RegionBounds::new(
        [min_x as i64, min_y as i64, min_z as i64],
        [max_x as i64, max_y as i64, max_z as i64],
    );
    let buf = std::slice::from_raw_parts_mut(out_buf, out_len);
    extract_region(&state.mass, species as usize, &bounds, buf)
}

/// Imports a box `[min, max)` of one species' masses from a flat buffer.
///
/// # Layout
/// The buffer is read in z,y,x order (matching `owq_extract_region`).
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
/// - `in_buf` must point to at least `in_len` doubles
///
/// # Returns
/// Number of values read, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn owq_import_region(
    ptr: *mut Engine,
    compartment: u32,
    species: u32,
    in_buf: *const f64,
    in_len: usize,
    min_x: i32,
    min_y: i32,
    min_z: i32,
    max_x: i32,
    max_y: i32,
    max_z: i32,
) -> u64 {
    if ptr.is_null() || in_buf.is_null() {
        return 0;
    }
    let Some(state) = (*ptr).compartment_mut(compartment as usize) else {
        return 0;
    };

    let bounds = RegionBounds::new(
        [min_x as i64, min_y as i64, min_z as i64],
        [max_x as i64, max_y as i64, max_z as i64],
    );
    let buf = std::slice::from_raw_parts(in_buf, in_len);
    import_region(&mut state.mass, species as usize, &bounds, buf)
}
