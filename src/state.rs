//! Compartment and mass state.

use crate::chem::catalog::SpeciesCatalog;
use crate::chem::grid::{in_bounds, index_of, GridExtents};

/// A hydrological compartment of the host model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compartment {
    pub index: usize,
    pub name: String,
    pub extents: GridExtents,
}

/// Per-species cell masses (grams) for one compartment.
///
/// One flat array per species, laid out by [`index_of`].
#[derive(Debug, Clone, PartialEq)]
pub struct MassState {
    pub extents: GridExtents,
    pub species: Vec<Vec<f64>>,
}

impl MassState {
    /// Allocate zeroed masses for `num_species` species.
    pub fn new(num_species: usize, extents: GridExtents) -> Self {
        MassState {
            extents,
            species: vec![vec![0.0; extents.cell_count()]; num_species],
        }
    }

    /// Get the linear index for a 3D coordinate.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        index_of(&self.extents, x, y, z)
    }

    /// Read one cell. Returns 0.0 for unknown species or out-of-bounds cells.
    pub fn get(&self, species: usize, x: usize, y: usize, z: usize) -> f64 {
        if !in_bounds(&self.extents, x, y, z) {
            return 0.0;
        }
        let idx = self.index(x, y, z);
        self.species
            .get(species)
            .map(|cells| cells[idx])
            .unwrap_or(0.0)
    }

    /// Write one cell. Unknown species and out-of-bounds cells are ignored.
    pub fn set(&mut self, species: usize, x: usize, y: usize, z: usize, value: f64) -> bool {
        if !in_bounds(&self.extents, x, y, z) {
            return false;
        }
        let idx = self.index(x, y, z);
        match self.species.get_mut(species) {
            Some(cells) => {
                cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// All cells of one species.
    #[inline]
    pub fn cells(&self, species: usize) -> &[f64] {
        debug_assert!(species < self.species.len(), "species {} out of range", species);
        &self.species[species]
    }

    /// Mutable access to two distinct species arrays at once.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> (&mut [f64], &mut [f64]) {
        debug_assert_ne!(a, b);
        if a < b {
            let (lo, hi) = self.species.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.species.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Sum of one species over all cells.
    pub fn species_total(&self, species: usize) -> f64 {
        self.species
            .get(species)
            .map(|cells| cells.iter().sum())
            .unwrap_or(0.0)
    }

    /// Sum over every species and cell.
    pub fn total(&self) -> f64 {
        self.species.iter().flat_map(|cells| cells.iter()).sum()
    }
}

/// Everything the engine owns for one compartment.
#[derive(Debug, Clone)]
pub struct CompartmentState {
    pub compartment: Compartment,
    pub catalog: SpeciesCatalog,
    pub mass: MassState,
}

impl CompartmentState {
    pub fn new(compartment: Compartment, catalog: SpeciesCatalog) -> Self {
        let mass = MassState::new(catalog.len(), compartment.extents);
        CompartmentState {
            compartment,
            catalog,
            mass,
        }
    }

    pub fn name(&self) -> &str {
        &self.compartment.name
    }
}
