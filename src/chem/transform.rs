//! Building a transformation into its bound, compiled form.

use super::bind::bind;
use super::catalog::SpeciesCatalog;
use super::expression::{CompiledExpression, Evaluator};
use super::resolve::{resolve, tokenize_kinetics};
use crate::config::TransformationConfig;
use crate::error::TransformError;

/// A transformation resolved against a catalog and compiled, ready for grid passes.
///
/// Immutable once built, so it can be shared across threads and cached across
/// time steps. Local vectors live in the [`Evaluator`]s handed out per worker.
#[derive(Debug, Clone)]
pub struct BoundTransformation {
    pub consumed: usize,
    pub produced: usize,
    /// Input species; position `k` feeds local-vector slot `k`.
    pub inputs: Vec<usize>,
    pub expression: CompiledExpression,
    /// Bound expression text, for diagnostics.
    pub bound_text: String,
}

impl BoundTransformation {
    /// Resolve, bind and compile one transformation record.
    pub fn build(
        catalog: &SpeciesCatalog,
        record: &TransformationConfig,
    ) -> Result<Self, TransformError> {
        let tokens = tokenize_kinetics(&record.kinetics)?;
        let resolution = resolve(
            catalog,
            &record.consumed,
            &record.produced,
            &record.kinetics,
            &tokens,
        )?;
        let bound = bind(
            catalog,
            &resolution,
            &tokens,
            &record.parameter_names,
            &record.parameter_values,
        )?;
        let expression = CompiledExpression::compile(&bound)?;

        Ok(BoundTransformation {
            consumed: resolution.consumed,
            produced: resolution.produced,
            inputs: resolution.inputs,
            expression,
            bound_text: bound.text(),
        })
    }

    /// A fresh local vector bound to the compiled expression.
    pub fn evaluator(&self) -> Evaluator<'_> {
        self.expression.evaluator()
    }

    /// Consumed and produced species are the same; every pass is a no-op.
    pub fn is_self_transformation(&self) -> bool {
        self.consumed == self.produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindingError, CompileError, ResolutionError};

    fn record(consumed: &str, produced: &str, kinetics: &str, params: &[(&str, f64)]) -> TransformationConfig {
        TransformationConfig {
            consumed: consumed.to_string(),
            produced: produced.to_string(),
            kinetics: kinetics.to_string(),
            parameter_names: params.iter().map(|(n, _)| n.to_string()).collect(),
            parameter_values: params.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_build_example() {
        let catalog = SpeciesCatalog::new(["A", "B"]).unwrap();
        let bound = BoundTransformation::build(&catalog, &record("A", "B", "k*A", &[("k", 0.1)]))
            .unwrap();

        assert_eq!(bound.consumed, 0);
        assert_eq!(bound.produced, 1);
        assert_eq!(bound.inputs, vec![0]);
        assert_eq!(bound.bound_text, "0.1 * local[0]");
        assert!(!bound.is_self_transformation());

        let mut ev = bound.evaluator();
        ev.local_mut()[0] = 10.0;
        assert_eq!(ev.evaluate(), 1.0);
    }

    #[test]
    fn test_build_reports_each_stage() {
        let catalog = SpeciesCatalog::new(["A", "B"]).unwrap();

        let err = BoundTransformation::build(&catalog, &record("C", "B", "A", &[])).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Resolution(ResolutionError::UnknownSpecies { .. })
        ));

        let err = BoundTransformation::build(&catalog, &record("A", "B", "k*A", &[])).unwrap_err();
        assert_eq!(
            err,
            TransformError::Binding(BindingError::UnknownIdentifier {
                name: "k".to_string()
            })
        );

        let err = BoundTransformation::build(&catalog, &record("A", "B", "nope(A)", &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Compile(CompileError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_parameter_substitution_matches_manual_formula() {
        let catalog = SpeciesCatalog::new(["DOC", "O2", "CO2"]).unwrap();
        let params = [("kmax", 0.8), ("ks", 12.5), ("ko", 0.4)];
        let bound = BoundTransformation::build(
            &catalog,
            &record("DOC", "CO2", "kmax*DOC/(ks+DOC)*O2/(ko+O2)", &params),
        )
        .unwrap();

        let (doc, o2) = (30.0, 2.0);
        let manual = 0.8 * doc / (12.5 + doc) * o2 / (0.4 + o2);

        let mut ev = bound.evaluator();
        ev.local_mut().copy_from_slice(&[doc, o2]);
        assert_eq!(ev.evaluate(), manual);
    }

    #[test]
    fn test_self_transformation_flag() {
        let catalog = SpeciesCatalog::new(["A"]).unwrap();
        let bound = BoundTransformation::build(&catalog, &record("A", "A", "A", &[])).unwrap();
        assert!(bound.is_self_transformation());
    }
}
