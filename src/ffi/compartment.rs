//! Compartment registration and species lookup.

use std::os::raw::c_char;

use super::c_str;
use crate::chem::{Engine, GridExtents};

/// Registers a compartment with an `nx * ny * nz` grid and its species names.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
/// - `name` must be a NUL-terminated string
/// - `species_names` must point to `n_species` NUL-terminated strings
///
/// # Returns
/// The compartment index, or -1 on null pointers or rejected input
/// (duplicate compartment, empty or duplicate species names).
#[no_mangle]
pub unsafe extern "C" fn owq_add_compartment(
    ptr: *mut Engine,
    name: *const c_char,
    nx: u32,
    ny: u32,
    nz: u32,
    species_names: *const *const c_char,
    n_species: usize,
) -> i32 {
    if ptr.is_null() || species_names.is_null() {
        return -1;
    }
    let Ok(name) = c_str(name) else {
        return -1;
    };

    let raw_names = std::slice::from_raw_parts(species_names, n_species);
    let mut species = Vec::with_capacity(n_species);
    for &raw in raw_names {
        let Ok(species_name) = c_str(raw) else {
            log::error!("owq_add_compartment '{}': null or invalid species name", name);
            return -1;
        };
        species.push(species_name);
    }

    let engine = &mut *ptr;
    let extents = GridExtents::new(nx as usize, ny as usize, nz as usize);
    match engine.add_compartment(name, extents, species) {
        Ok(index) => index as i32,
        Err(err) => {
            log::error!("owq_add_compartment '{}': {}", name, err);
            -1
        }
    }
}

/// Looks up a species index within a compartment's catalog.
///
/// # Safety
/// - `ptr` must be a valid pointer to an Engine, or null
/// - `name` must be a NUL-terminated string
///
/// # Returns
/// The species index, or -1 if the compartment or species is unknown.
#[no_mangle]
pub unsafe extern "C" fn owq_species_index(
    ptr: *const Engine,
    compartment: u32,
    name: *const c_char,
) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    let Ok(name) = c_str(name) else {
        return -1;
    };

    (*ptr)
        .compartment(compartment as usize)
        .and_then(|state| state.catalog.index_of(name))
        .map(|index| index as i32)
        .unwrap_or(-1)
}
