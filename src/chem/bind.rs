//! Expression binding.
//!
//! Rewrites the tokenized kinetics so that species identifiers become
//! local-vector slot references and parameters become numeric literals. The
//! substitution happens on tokens, so a parameter `k` never touches `k2` and a
//! species `N` never touches `NH4`.

use std::collections::BTreeMap;

use meval::tokenizer::{Operation, Token};

use super::catalog::SpeciesCatalog;
use super::resolve::Resolution;
use crate::error::BindingError;

const SLOT_PREFIX: &str = "local[";

/// Name of the variable token standing for local-vector slot `k`.
pub fn slot_ident(slot: usize) -> String {
    format!("{}{}]", SLOT_PREFIX, slot)
}

/// Slot number of a variable token produced by [`slot_ident`].
pub fn slot_of(name: &str) -> Option<usize> {
    name.strip_prefix(SLOT_PREFIX)?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Kinetics with every identifier bound.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundKinetics {
    /// Infix tokens containing only slot variables, literals, operators and calls.
    pub tokens: Vec<Token>,
    /// Number of local-vector slots referenced.
    pub slot_count: usize,
}

impl BoundKinetics {
    /// Render the bound tokens as expression text.
    pub fn text(&self) -> String {
        render(&self.tokens)
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Collect declared parameters, checking each has a finite value and a distinct name.
fn collect_parameters(
    catalog: &SpeciesCatalog,
    names: &[String],
    values: &BTreeMap<String, f64>,
) -> Result<BTreeMap<String, f64>, BindingError> {
    let mut params = BTreeMap::new();
    for name in names {
        let name = name.trim();
        if catalog.index_of(name).is_some() {
            return Err(BindingError::ParameterShadowsSpecies {
                name: name.to_string(),
            });
        }
        let value = *values
            .get(name)
            .ok_or_else(|| BindingError::MissingParameterValue {
                name: name.to_string(),
            })?;
        if !value.is_finite() {
            return Err(BindingError::NonFiniteParameter {
                name: name.to_string(),
                value,
            });
        }
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

/// Bind kinetics tokens to slots and parameter literals.
pub fn bind(
    catalog: &SpeciesCatalog,
    resolution: &Resolution,
    tokens: &[Token],
    parameter_names: &[String],
    parameter_values: &BTreeMap<String, f64>,
) -> Result<BoundKinetics, BindingError> {
    let params = collect_parameters(catalog, parameter_names, parameter_values)?;
    let mut used = vec![false; params.len()];

    let mut bound = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Token::Var(name) = token else {
            bound.push(token.clone());
            continue;
        };

        if let Some(species) = catalog.index_of(name) {
            let slot = resolution
                .inputs
                .iter()
                .position(|&s| s == species)
                .ok_or_else(|| BindingError::UnknownIdentifier { name: name.clone() })?;
            bound.push(Token::Var(slot_ident(slot)));
        } else if let Some(pos) = params.keys().position(|p| p == name) {
            used[pos] = true;
            bound.push(Token::Number(params[name]));
        } else if let Some(value) = constant(name) {
            bound.push(Token::Number(value));
        } else {
            return Err(BindingError::UnknownIdentifier { name: name.clone() });
        }
    }

    if let Some((name, _)) = params.keys().zip(&used).find(|(_, used)| !**used) {
        return Err(BindingError::UnusedParameter { name: name.clone() });
    }

    Ok(BoundKinetics {
        tokens: bound,
        slot_count: resolution.inputs.len(),
    })
}

fn operator_symbol(op: &Operation) -> &'static str {
    match op {
        Operation::Plus => "+",
        Operation::Minus => "-",
        Operation::Times => "*",
        Operation::Div => "/",
        Operation::Rem => "%",
        Operation::Pow => "^",
    }
}

/// Render infix tokens back to text, floats in shortest round-trip form.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Binary(op) => {
                out.push(' ');
                out.push_str(operator_symbol(op));
                out.push(' ');
            }
            Token::Unary(op) => out.push_str(operator_symbol(op)),
            Token::LParen => out.push('('),
            Token::RParen => out.push(')'),
            Token::Comma => out.push_str(", "),
            Token::Number(v) => out.push_str(&format!("{:?}", v)),
            Token::Var(name) => out.push_str(name),
            Token::Func(name, _) => {
                out.push_str(name);
                out.push('(');
            }
        }
    }
    out
}
