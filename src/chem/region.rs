//! Copying boxes of one species' cells to and from host buffers.

use std::ops::Range;

use super::grid::{index_of, GridExtents};
use crate::state::MassState;

/// Half-open box `[min, max)` in cell coordinates, as given by the host.
///
/// Coordinates may be negative or past the grid; they are clamped before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub min: [i64; 3],
    pub max: [i64; 3],
}

impl RegionBounds {
    pub fn new(min: [i64; 3], max: [i64; 3]) -> Self {
        RegionBounds { min, max }
    }

    /// The whole grid.
    pub fn full(extents: &GridExtents) -> Self {
        RegionBounds {
            min: [0; 3],
            max: [extents.nx as i64, extents.ny as i64, extents.nz as i64],
        }
    }

    /// Clamp to the grid. `None` when the clamped box is empty.
    fn clamp(&self, extents: &GridExtents) -> Option<[Range<usize>; 3]> {
        let limits = [extents.nx, extents.ny, extents.nz];
        let axis = |a: usize| {
            let limit = limits[a] as i64;
            let lo = self.min[a].clamp(0, limit) as usize;
            let hi = self.max[a].clamp(0, limit) as usize;
            lo..hi
        };
        let ranges = [axis(0), axis(1), axis(2)];
        if ranges.iter().any(|r| r.start >= r.end) {
            return None;
        }
        Some(ranges)
    }

    /// Number of cells in the clamped box.
    pub fn cell_count(&self, extents: &GridExtents) -> usize {
        self.clamp(extents)
            .map(|[x, y, z]| x.len() * y.len() * z.len())
            .unwrap_or(0)
    }
}

/// Visit every cell index of the clamped box in z,y,x order (x fastest).
fn for_each_index(extents: &GridExtents, ranges: [Range<usize>; 3], mut f: impl FnMut(usize)) {
    let [xs, ys, zs] = ranges;
    for z in zs {
        for y in ys.clone() {
            for x in xs.clone() {
                f(index_of(extents, x, y, z));
            }
        }
    }
}

/// Copy one species' masses inside `bounds` into `out`.
///
/// The buffer is filled in z,y,x order, matching [`import_region`].
///
/// # Returns
/// Number of values written, or 0 for an unknown species, an empty box or a
/// buffer smaller than the clamped box.
pub fn extract_region(mass: &MassState, species: usize, bounds: &RegionBounds, out: &mut [f64]) -> u64 {
    let Some(cells) = mass.species.get(species) else {
        return 0;
    };
    let Some(ranges) = bounds.clamp(&mass.extents) else {
        return 0;
    };
    if out.len() < bounds.cell_count(&mass.extents) {
        return 0;
    }

    let mut offset = 0;
    for_each_index(&mass.extents, ranges, |idx| {
        out[offset] = cells[idx];
        offset += 1;
    });
    offset as u64
}

/// Overwrite one species' masses inside `bounds` from `input`, read in z,y,x order.
///
/// # Returns
/// Number of values read, or 0 on the same conditions as [`extract_region`].
pub fn import_region(mass: &mut MassState, species: usize, bounds: &RegionBounds, input: &[f64]) -> u64 {
    let extents = mass.extents;
    let Some(ranges) = bounds.clamp(&extents) else {
        return 0;
    };
    if input.len() < bounds.cell_count(&extents) {
        return 0;
    }
    let Some(cells) = mass.species.get_mut(species) else {
        return 0;
    };

    let mut offset = 0;
    for_each_index(&extents, ranges, |idx| {
        cells[idx] = input[offset];
        offset += 1;
    });
    offset as u64
}
