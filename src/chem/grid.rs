//! Grid extents and cell indexing.

/// Number of cells along each axis of a compartment grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridExtents {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridExtents {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        GridExtents { nx, ny, nz }
    }

    /// Total number of cells. Only valid for extents that passed
    /// [`GridExtents::checked_cell_count`].
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Total number of cells, `None` if it does not fit in `usize`.
    pub fn checked_cell_count(&self) -> Option<usize> {
        self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
    }
}

/// Calculate the linear index for a 3D coordinate (z slowest, x fastest).
#[inline]
pub fn index_of(extents: &GridExtents, x: usize, y: usize, z: usize) -> usize {
    z * extents.ny * extents.nx + y * extents.nx + x
}

/// Recover `(x, y, z)` from a linear index produced by [`index_of`].
#[inline]
pub fn coords_of(extents: &GridExtents, idx: usize) -> (usize, usize, usize) {
    let plane = extents.nx * extents.ny;
    let z = idx / plane;
    let rem = idx % plane;
    (rem % extents.nx, rem / extents.nx, z)
}

/// Check if coordinates are within grid bounds.
#[inline]
pub fn in_bounds(extents: &GridExtents, x: usize, y: usize, z: usize) -> bool {
    x < extents.nx && y < extents.ny && z < extents.nz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of() {
        let extents = GridExtents::new(4, 4, 4);

        // First cell
        assert_eq!(index_of(&extents, 0, 0, 0), 0);
        // Last cell
        assert_eq!(index_of(&extents, 3, 3, 3), 63);
        assert_eq!(index_of(&extents, 1, 0, 0), 1);
        assert_eq!(index_of(&extents, 0, 1, 0), 4);
        assert_eq!(index_of(&extents, 0, 0, 1), 16);
    }

    #[test]
    fn test_coords_of_inverts_index_of() {
        let extents = GridExtents::new(5, 3, 2);
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..5 {
                    let idx = index_of(&extents, x, y, z);
                    assert_eq!(coords_of(&extents, idx), (x, y, z));
                }
            }
        }
    }

    #[test]
    fn test_in_bounds() {
        let extents = GridExtents::new(4, 2, 1);

        assert!(in_bounds(&extents, 0, 0, 0));
        assert!(in_bounds(&extents, 3, 1, 0));

        assert!(!in_bounds(&extents, 4, 0, 0));
        assert!(!in_bounds(&extents, 0, 2, 0));
        assert!(!in_bounds(&extents, 0, 0, 1));
    }

    #[test]
    fn test_cell_count() {
        assert_eq!(GridExtents::new(8, 8, 8).cell_count(), 512);
        assert_eq!(GridExtents::new(0, 8, 8).cell_count(), 0);
        assert_eq!(GridExtents::new(8, 8, 8).checked_cell_count(), Some(512));
        assert_eq!(GridExtents::new(usize::MAX, 2, 1).checked_cell_count(), None);
    }
}
