//! The engine: compartments, configuration and the worker pool that steps them.

use rayon::prelude::*;

use super::cache::BindingCache;
use super::catalog::SpeciesCatalog;
use super::cycle::{run_compartment, CompartmentReport};
use super::grid::GridExtents;
use crate::config::{BgcConfig, EngineOptions};
use crate::error::{EngineError, TransformationFailure};
use crate::state::{Compartment, CompartmentState};

/// One compartment together with the bindings cached for it.
#[derive(Debug)]
pub struct CompartmentSlot {
    pub state: CompartmentState,
    pub cache: BindingCache,
}

/// Summary of one [`Engine::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Transformations applied across all compartments.
    pub applied: usize,
    pub cells_skipped: usize,
    pub failures: Vec<TransformationFailure>,
}

impl RunReport {
    fn absorb(&mut self, report: CompartmentReport) {
        self.applied += report.applied;
        self.cells_skipped += report.cells_skipped;
        self.failures.extend(report.failures);
    }
}

pub struct Engine {
    options: EngineOptions,
    config: BgcConfig,
    compartments: Vec<CompartmentSlot>,

    /// Rayon thread pool sized by `options.num_threads`.
    thread_pool: rayon::ThreadPool,

    /// Completed runs.
    step_count: u64,
}

fn build_pool(num_threads: usize) -> Result<rayon::ThreadPool, EngineError> {
    let num_threads = num_threads.max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .or_else(|err| {
            log::warn!(
                "could not build a pool of {} threads ({}), using 1",
                num_threads,
                err
            );
            rayon::ThreadPoolBuilder::new().num_threads(1).build()
        })
        .map_err(EngineError::from)
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        let thread_pool = build_pool(options.num_threads)?;
        log::debug!(
            "engine created with {} thread(s), non-finite policy {:?}",
            thread_pool.current_num_threads(),
            options.non_finite
        );

        Ok(Engine {
            options,
            config: BgcConfig::default(),
            compartments: Vec::new(),
            thread_pool,
            step_count: 0,
        })
    }

    /// Register a compartment with its grid and species catalog. Masses start at zero.
    ///
    /// Returns the compartment index.
    pub fn add_compartment<I, S>(
        &mut self,
        name: &str,
        extents: GridExtents,
        species: I,
    ) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::config("compartment name is empty"));
        }
        if self.compartment_index(name).is_some() {
            return Err(EngineError::DuplicateCompartment(name.to_string()));
        }
        if extents.checked_cell_count().is_none() {
            return Err(EngineError::config(format!(
                "compartment '{}': grid {}x{}x{} has too many cells",
                name, extents.nx, extents.ny, extents.nz
            )));
        }

        let catalog = SpeciesCatalog::new(species)?;
        let index = self.compartments.len();
        let compartment = Compartment {
            index,
            name: name.to_string(),
            extents,
        };
        log::debug!(
            "compartment '{}' added: {}x{}x{} cells, {} species",
            name,
            extents.nx,
            extents.ny,
            extents.nz,
            catalog.len()
        );

        self.compartments.push(CompartmentSlot {
            state: CompartmentState::new(compartment, catalog),
            cache: BindingCache::new(),
        });
        Ok(index)
    }

    /// Replace the configuration. Cached bindings are dropped.
    pub fn set_config(&mut self, config: BgcConfig) {
        for slot in &mut self.compartments {
            slot.cache.clear();
        }
        for name in config.compartment_frameworks.keys() {
            if self.compartment_index(name).is_none() {
                log::warn!("configuration names unknown compartment '{}'", name);
            }
        }
        self.config = config;
    }

    pub fn config(&self) -> &BgcConfig {
        &self.config
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn compartment_index(&self, name: &str) -> Option<usize> {
        self.compartments
            .iter()
            .position(|slot| slot.state.name() == name)
    }

    pub fn compartment(&self, index: usize) -> Option<&CompartmentState> {
        self.compartments.get(index).map(|slot| &slot.state)
    }

    pub fn compartment_mut(&mut self, index: usize) -> Option<&mut CompartmentState> {
        self.compartments.get_mut(index).map(|slot| &mut slot.state)
    }

    pub fn num_compartments(&self) -> usize {
        self.compartments.len()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Apply every configured transformation once.
    ///
    /// Compartments are independent and run in parallel; inside a compartment
    /// transformations run in configured order.
    pub fn run(&mut self) -> RunReport {
        let Engine {
            options,
            config,
            compartments,
            thread_pool,
            step_count,
        } = self;

        let reports: Vec<CompartmentReport> = thread_pool.install(|| {
            compartments
                .par_iter_mut()
                .map(|slot| run_compartment(config, &mut slot.state, &mut slot.cache, options))
                .collect()
        });

        let mut report = RunReport::default();
        for compartment_report in reports {
            report.absorb(compartment_report);
        }

        *step_count += 1;
        log::info!(
            "run {}: {} transformation(s) applied, {} failed, {} cell(s) skipped",
            step_count,
            report.applied,
            report.failures.len(),
            report.cells_skipped
        );
        report
    }
}
