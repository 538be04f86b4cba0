//! Applying one bound transformation to every cell of a compartment.
//!
//! The pass runs in two phases:
//! - Evaluate: every cell loads its input species into a local vector and
//!   evaluates the kinetics, giving one transfer per cell. Reads only.
//! - Apply: `consumed -= transfer`, `produced += transfer` per cell.
//!
//! A cell only reads and writes itself, so this is identical to a
//! read-evaluate-write loop over cells in linear (z, y, x) order, and both
//! phases can be split across rayon workers. Each worker owns its evaluator.

use rayon::prelude::*;

use super::grid::coords_of;
use super::transform::BoundTransformation;
use crate::config::NonFinitePolicy;
use crate::error::EvaluationError;
use crate::state::MassState;

/// Outcome of one grid pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassStats {
    pub cells: usize,
    /// Cells left untouched because their transfer was not finite.
    pub skipped: usize,
    /// Sum of applied transfers (grams).
    pub transferred: f64,
}

/// Evaluate the transformation at every cell without writing anything.
pub fn compute_transfers(bound: &BoundTransformation, mass: &MassState) -> Vec<f64> {
    let inputs: Vec<&[f64]> = bound.inputs.iter().map(|&s| mass.cells(s)).collect();
    let cell_count = mass.extents.cell_count();

    (0..cell_count)
        .into_par_iter()
        .map_init(
            || bound.evaluator(),
            |ev, cell| {
                for (slot, cells) in ev.local_mut().iter_mut().zip(&inputs) {
                    *slot = cells[cell];
                }
                ev.evaluate()
            },
        )
        .collect()
}

/// Move `transfers[cell]` from the consumed to the produced species at each cell.
/// Non-finite transfers are not applied.
pub fn apply_transfers(bound: &BoundTransformation, mass: &mut MassState, transfers: &[f64]) {
    if bound.is_self_transformation() {
        return;
    }

    let (consumed, produced) = mass.pair_mut(bound.consumed, bound.produced);
    consumed
        .par_iter_mut()
        .zip(produced.par_iter_mut())
        .zip(transfers.par_iter())
        .for_each(|((c, p), &t)| {
            if t.is_finite() {
                *c -= t;
                *p += t;
            }
        });
}

/// Run the full grid pass for one transformation.
///
/// With [`NonFinitePolicy::Abort`] a non-finite transfer fails the pass
/// before any cell is written, naming the first offending cell in traversal
/// order. With [`NonFinitePolicy::Skip`] those cells are left as they were.
pub fn apply_transformation(
    bound: &BoundTransformation,
    mass: &mut MassState,
    policy: NonFinitePolicy,
) -> Result<PassStats, EvaluationError> {
    let cells = mass.extents.cell_count();
    if cells == 0 {
        return Ok(PassStats::default());
    }
    if bound.is_self_transformation() {
        log::debug!("'{}' consumes and produces the same species, nothing to move", bound.bound_text);
        return Ok(PassStats {
            cells,
            ..Default::default()
        });
    }

    let transfers = compute_transfers(bound, mass);

    let mut skipped = 0;
    if let Some(first) = transfers.iter().position(|t| !t.is_finite()) {
        let (x, y, z) = coords_of(&mass.extents, first);
        let value = transfers[first];
        match policy {
            NonFinitePolicy::Abort => {
                return Err(EvaluationError::NonFinite { x, y, z, value });
            }
            NonFinitePolicy::Skip => {
                skipped = transfers.iter().filter(|t| !t.is_finite()).count();
                log::warn!(
                    "skipping {} cell(s) with non-finite transfer, first {} at ({}, {}, {}) for '{}'",
                    skipped,
                    value,
                    x,
                    y,
                    z,
                    bound.bound_text
                );
            }
        }
    }

    apply_transfers(bound, mass, &transfers);

    let transferred = transfers.iter().filter(|t| t.is_finite()).sum();
    Ok(PassStats {
        cells,
        skipped,
        transferred,
    })
}
