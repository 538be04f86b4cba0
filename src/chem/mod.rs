//! Core biogeochemistry logic.
//!
//! Species lookup, kinetics binding and compilation, grid passes and the
//! cycle driver. The FFI layer in `ffi/` calls into [`engine::Engine`].

pub mod bind;
pub mod cache;
pub mod catalog;
pub mod cycle;
pub mod engine;
pub mod expression;
pub mod grid;
pub mod grid_pass;
pub mod region;
pub mod resolve;
pub mod transform;

pub use catalog::{ChemicalSpecies, SpeciesCatalog};
pub use cycle::{run_compartment, CompartmentReport};
pub use engine::{Engine, RunReport};
pub use grid::GridExtents;
pub use grid_pass::{apply_transformation, PassStats};
pub use region::{extract_region, import_region, RegionBounds};
pub use transform::BoundTransformation;
