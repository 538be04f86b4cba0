//! OpenWQ biogeochemistry engine.
//!
//! Applies user-configured chemical transformations (consumed species →
//! produced species at a rate given by a kinetics expression) to every cell
//! of every compartment of a host hydrological model, once per time step.
//!
//! This library provides a C ABI for the host model (see [`ffi`]) and a Rust
//! API centred on [`chem::Engine`].

pub mod chem;
pub mod config;
pub mod error;
pub mod ffi;
pub mod state;

pub use chem::{Engine, GridExtents, RunReport};
pub use config::{BgcConfig, EngineOptions, NonFinitePolicy};
pub use error::{EngineError, TransformError, TransformationFailure};
