//! Identifier resolution against the species catalog.
//!
//! Every match is whole-token: `N` never matches inside `NH4`, in the kinetics
//! text or in the consumed/produced specifications.

use meval::tokenizer::{tokenize, Token};

use super::catalog::SpeciesCatalog;
use crate::error::{ResolutionError, SpecRole};

/// Species indices a transformation operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub consumed: usize,
    pub produced: usize,
    /// Unique species referenced by the kinetics, in first-occurrence order.
    /// Position in this list is the local-vector slot.
    pub inputs: Vec<usize>,
}

/// Tokenize a kinetics formula into identifiers, operators and literals.
pub fn tokenize_kinetics(kinetics: &str) -> Result<Vec<Token>, ResolutionError> {
    tokenize(kinetics).map_err(|err| ResolutionError::Tokenize {
        kinetics: kinetics.to_string(),
        message: err.to_string(),
    })
}

/// Split a specification string into identifier-shaped tokens.
fn identifier_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// Resolve a consumed/produced specification to exactly one species.
pub fn resolve_spec(
    catalog: &SpeciesCatalog,
    spec: &str,
    role: SpecRole,
) -> Result<usize, ResolutionError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(ResolutionError::EmptySpec { role });
    }

    // Names that are not identifier-shaped can still be given verbatim.
    if let Some(index) = catalog.index_of(spec) {
        return Ok(index);
    }

    let mut matches: Vec<usize> = Vec::new();
    for token in identifier_tokens(spec) {
        if let Some(index) = catalog.index_of(token) {
            if !matches.contains(&index) {
                matches.push(index);
            }
        }
    }

    match matches.as_slice() {
        [] => Err(ResolutionError::UnknownSpecies {
            role,
            spec: spec.to_string(),
        }),
        [index] => Ok(*index),
        _ => Err(ResolutionError::AmbiguousSpec {
            role,
            spec: spec.to_string(),
            candidates: matches
                .iter()
                .filter_map(|&i| catalog.name(i).map(str::to_string))
                .collect(),
        }),
    }
}

/// Species referenced by the kinetics tokens, unique, in first-occurrence order.
pub fn input_species(catalog: &SpeciesCatalog, tokens: &[Token]) -> Vec<usize> {
    let mut inputs = Vec::new();
    for token in tokens {
        if let Token::Var(name) = token {
            if let Some(index) = catalog.index_of(name) {
                if !inputs.contains(&index) {
                    inputs.push(index);
                }
            }
        }
    }
    inputs
}

/// Resolve consumed, produced and input species for one transformation.
pub fn resolve(
    catalog: &SpeciesCatalog,
    consumed_spec: &str,
    produced_spec: &str,
    kinetics: &str,
    tokens: &[Token],
) -> Result<Resolution, ResolutionError> {
    let consumed = resolve_spec(catalog, consumed_spec, SpecRole::Consumed)?;
    let produced = resolve_spec(catalog, produced_spec, SpecRole::Produced)?;

    let inputs = input_species(catalog, tokens);
    if inputs.is_empty() {
        return Err(ResolutionError::NoInputSpecies {
            kinetics: kinetics.to_string(),
        });
    }

    Ok(Resolution {
        consumed,
        produced,
        inputs,
    })
}
