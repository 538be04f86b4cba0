//! Cycle driver: compartments → cycling frameworks → transformations.
//!
//! Transformations inside a compartment run strictly in configured order
//! (frameworks as listed, ordinals ascending); a later transformation sees the
//! masses written by an earlier one. A failing transformation is reported and
//! skipped; the rest of the compartment still runs.

use std::sync::Arc;

use super::cache::BindingCache;
use super::grid_pass::apply_transformation;
use super::transform::BoundTransformation;
use crate::config::{BgcConfig, EngineOptions};
use crate::error::{TransformError, TransformationFailure};
use crate::state::CompartmentState;

/// Result of running every configured transformation in one compartment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompartmentReport {
    pub applied: usize,
    pub cells_skipped: usize,
    pub failures: Vec<TransformationFailure>,
}

fn failure(
    state: &CompartmentState,
    framework: &str,
    ordinal: Option<u32>,
    error: TransformError,
) -> TransformationFailure {
    let failure = TransformationFailure {
        compartment: state.name().to_string(),
        framework: framework.to_string(),
        ordinal,
        error,
    };
    log::error!("{}", failure);
    failure
}

/// Run one compartment's cycling frameworks against its mass state.
pub fn run_compartment(
    config: &BgcConfig,
    state: &mut CompartmentState,
    cache: &mut BindingCache,
    options: &EngineOptions,
) -> CompartmentReport {
    let mut report = CompartmentReport::default();

    let framework_names = config.frameworks_for(state.name());
    if framework_names.is_empty() {
        log::warn!("compartment '{}' has no cycling frameworks", state.name());
        return report;
    }

    for framework_name in framework_names {
        let Some(framework) = config.frameworks.get(framework_name) else {
            report.failures.push(failure(
                state,
                framework_name,
                None,
                TransformError::UnknownFramework {
                    framework: framework_name.clone(),
                },
            ));
            continue;
        };

        for ordinal in framework.ordinals() {
            let Some(record) = framework.transformation(ordinal) else {
                let error = match framework.rejection(ordinal) {
                    Some(reason) => TransformError::InvalidRecord {
                        ordinal,
                        reason: reason.to_string(),
                    },
                    None => TransformError::MissingRecord { ordinal },
                };
                report
                    .failures
                    .push(failure(state, framework_name, Some(ordinal), error));
                continue;
            };

            let built = if options.cache_bindings {
                cache.get_or_build(framework_name, ordinal, || {
                    BoundTransformation::build(&state.catalog, record)
                })
            } else {
                BoundTransformation::build(&state.catalog, record).map(Arc::new)
            };

            let bound = match built {
                Ok(bound) => bound,
                Err(error) => {
                    report
                        .failures
                        .push(failure(state, framework_name, Some(ordinal), error));
                    continue;
                }
            };

            log::debug!(
                "{}/{}#{}: {} -> {} via {}",
                state.name(),
                framework_name,
                ordinal,
                record.consumed,
                record.produced,
                bound.bound_text
            );

            match apply_transformation(&bound, &mut state.mass, options.non_finite) {
                Ok(stats) => {
                    report.applied += 1;
                    report.cells_skipped += stats.skipped;
                }
                Err(error) => {
                    report.failures.push(failure(
                        state,
                        framework_name,
                        Some(ordinal),
                        error.into(),
                    ));
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::catalog::SpeciesCatalog;
    use crate::chem::grid::GridExtents;
    use crate::config::{CyclingFramework, NonFinitePolicy, TransformationConfig};
    use crate::error::ResolutionError;
    use crate::state::Compartment;
    use std::collections::BTreeMap;

    fn record(consumed: &str, produced: &str, kinetics: &str) -> TransformationConfig {
        TransformationConfig {
            consumed: consumed.to_string(),
            produced: produced.to_string(),
            kinetics: kinetics.to_string(),
            ..Default::default()
        }
    }

    fn framework(records: Vec<(u32, TransformationConfig)>) -> CyclingFramework {
        CyclingFramework {
            list_transformations: records.iter().map(|(o, _)| *o).collect(),
            transformations: records.into_iter().collect(),
            ..Default::default()
        }
    }

    fn soil(species: &[&str]) -> CompartmentState {
        CompartmentState::new(
            Compartment {
                index: 0,
                name: "SOIL".to_string(),
                extents: GridExtents::new(2, 2, 1),
            },
            SpeciesCatalog::new(species.iter().copied()).unwrap(),
        )
    }

    fn config(frameworks: Vec<(&str, CyclingFramework)>) -> BgcConfig {
        let names: Vec<String> = frameworks.iter().map(|(n, _)| n.to_string()).collect();
        BgcConfig {
            compartment_frameworks: BTreeMap::from([("SOIL".to_string(), names)]),
            frameworks: frameworks
                .into_iter()
                .map(|(n, f)| (n.to_string(), f))
                .collect(),
        }
    }

    fn fill(state: &mut CompartmentState, species: usize, value: f64) {
        for cell in state.mass.species[species].iter_mut() {
            *cell = value;
        }
    }

    #[test]
    fn test_later_transformation_sees_earlier_writes() {
        // 1: A -> B moves half of A; 2: B -> C moves half of B.
        let cfg = config(vec![(
            "chain",
            framework(vec![
                (2, record("B", "C", "0.5*B")),
                (1, record("A", "B", "0.5*A")),
            ]),
        )]);
        let mut state = soil(&["A", "B", "C"]);
        fill(&mut state, 0, 8.0);

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &EngineOptions::default());

        assert_eq!(report.applied, 2);
        assert!(report.failures.is_empty());
        // Ordinal 1 first: A=4, B=4; then ordinal 2: B=2, C=2
        assert!(state.mass.species[0].iter().all(|&v| v == 4.0));
        assert!(state.mass.species[1].iter().all(|&v| v == 2.0));
        assert!(state.mass.species[2].iter().all(|&v| v == 2.0));
        assert_eq!(state.mass.total(), 32.0);
    }

    #[test]
    fn test_failure_does_not_stop_other_transformations() {
        let cfg = config(vec![(
            "N_cycle",
            framework(vec![
                (1, record("NO2", "NO3", "0.1*NH4")),
                (2, record("NH4", "NO3", "0.25*NH4")),
            ]),
        )]);
        let mut state = soil(&["NH4", "NO3"]);
        fill(&mut state, 0, 4.0);

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &EngineOptions::default());

        assert_eq!(report.applied, 1);
        assert_eq!(report.failures.len(), 1);
        let f = &report.failures[0];
        assert_eq!(f.compartment, "SOIL");
        assert_eq!(f.framework, "N_cycle");
        assert_eq!(f.ordinal, Some(1));
        assert!(matches!(
            f.error,
            TransformError::Resolution(ResolutionError::UnknownSpecies { .. })
        ));
        assert!(state.mass.species[1].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_unknown_framework_and_missing_record() {
        let mut fw = framework(vec![(1, record("A", "B", "A"))]);
        fw.list_transformations.push(5);
        let mut cfg = config(vec![("fw", fw)]);
        cfg.compartment_frameworks
            .get_mut("SOIL")
            .unwrap()
            .push("ghost".to_string());
        let mut state = soil(&["A", "B"]);

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &EngineOptions::default());

        assert_eq!(report.applied, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].error, TransformError::MissingRecord { ordinal: 5 });
        assert_eq!(report.failures[1].ordinal, None);
        assert!(matches!(
            report.failures[1].error,
            TransformError::UnknownFramework { .. }
        ));
    }

    #[test]
    fn test_unreadable_record_fails_only_its_ordinal() {
        let mut fw = framework(vec![(1, record("A", "B", "0.5*A"))]);
        fw.list_transformations.push(2);
        fw.rejected
            .insert(2, "missing field `kinetics`".to_string());
        let cfg = config(vec![("fw", fw)]);
        let mut state = soil(&["A", "B"]);
        fill(&mut state, 0, 2.0);

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &EngineOptions::default());

        assert_eq!(report.applied, 1);
        assert_eq!(report.failures.len(), 1);
        let message = report.failures[0].to_string();
        assert!(message.contains("compartment 'SOIL'"), "{}", message);
        assert!(message.contains("framework 'fw'"), "{}", message);
        assert!(message.contains("transformation 2"), "{}", message);
        assert!(message.contains("kinetics"), "{}", message);
        assert!(state.mass.species[1].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_unconfigured_compartment_untouched() {
        let cfg = BgcConfig::default();
        let mut state = soil(&["A", "B"]);
        fill(&mut state, 0, 1.0);
        let before = state.mass.clone();

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &EngineOptions::default());

        assert_eq!(report, CompartmentReport::default());
        assert_eq!(state.mass, before);
    }

    #[test]
    fn test_cache_reused_across_runs() {
        let cfg = config(vec![("fw", framework(vec![(1, record("A", "B", "0.5*A"))]))]);
        let mut state = soil(&["A", "B"]);
        fill(&mut state, 0, 8.0);
        let mut cache = BindingCache::new();

        run_compartment(&cfg, &mut state, &mut cache, &EngineOptions::default());
        run_compartment(&cfg, &mut state, &mut cache, &EngineOptions::default());

        assert_eq!(cache.len(), 1);
        assert!(state.mass.species[0].iter().all(|&v| v == 2.0));
        assert!(state.mass.species[1].iter().all(|&v| v == 6.0));
    }

    #[test]
    fn test_cache_disabled() {
        let cfg = config(vec![("fw", framework(vec![(1, record("A", "B", "0.5*A"))]))]);
        let mut state = soil(&["A", "B"]);
        let mut cache = BindingCache::new();
        let options = EngineOptions {
            cache_bindings: false,
            ..Default::default()
        };

        run_compartment(&cfg, &mut state, &mut cache, &options);

        assert!(cache.is_empty());
    }

    #[test]
    fn test_abort_policy_reports_cell() {
        let cfg = config(vec![("fw", framework(vec![(1, record("A", "B", "1/A"))]))]);
        let mut state = soil(&["A", "B"]);
        let options = EngineOptions {
            non_finite: NonFinitePolicy::Abort,
            ..Default::default()
        };

        let report = run_compartment(&cfg, &mut state, &mut BindingCache::new(), &options);

        assert_eq!(report.applied, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].to_string().contains("(0, 0, 0)"));
    }
}
