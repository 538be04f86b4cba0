//! Expression compiler and evaluator.
//!
//! Bound infix tokens are ordered into RPN by `meval`'s shunting-yard pass and
//! then lowered into a flat, slot-addressed program. Evaluation is a single
//! walk over that program with a reusable stack; no names are looked up and
//! nothing is parsed after compilation.

use meval::shunting_yard::to_rpn;
use meval::tokenizer::{Operation, Token};

use super::bind::{slot_of, BoundKinetics};
use crate::error::CompileError;

#[derive(Debug, Clone, Copy)]
enum Instr {
    Const(f64),
    Slot(usize),
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Call(fn(f64) -> f64),
    Atan2,
    Max(usize),
    Min(usize),
}

impl Instr {
    /// Values popped and pushed.
    fn stack_effect(&self) -> (usize, usize) {
        match self {
            Instr::Const(_) | Instr::Slot(_) => (0, 1),
            Instr::Neg | Instr::Call(_) => (1, 1),
            Instr::Add
            | Instr::Sub
            | Instr::Mul
            | Instr::Div
            | Instr::Rem
            | Instr::Pow
            | Instr::Atan2 => (2, 1),
            Instr::Max(n) | Instr::Min(n) => (*n, 1),
        }
    }
}

fn unary_function(name: &str) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match name {
        "sqrt" => f64::sqrt,
        "exp" => f64::exp,
        "ln" => f64::ln,
        "log10" => f64::log10,
        "abs" => f64::abs,
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "asin" => f64::asin,
        "acos" => f64::acos,
        "atan" => f64::atan,
        "sinh" => f64::sinh,
        "cosh" => f64::cosh,
        "tanh" => f64::tanh,
        "asinh" => f64::asinh,
        "acosh" => f64::acosh,
        "atanh" => f64::atanh,
        "floor" => f64::floor,
        "ceil" => f64::ceil,
        "round" => f64::round,
        "signum" => f64::signum,
        _ => return None,
    };
    Some(f)
}

fn function(name: &str, arity: usize) -> Result<Instr, CompileError> {
    let instr = match (name, arity) {
        ("atan2", 2) => Some(Instr::Atan2),
        ("max", n) if n >= 1 => Some(Instr::Max(n)),
        ("min", n) if n >= 1 => Some(Instr::Min(n)),
        (_, 1) => unary_function(name).map(Instr::Call),
        _ => None,
    };
    instr.ok_or_else(|| CompileError::UnknownFunction {
        name: name.to_string(),
        arity,
    })
}

/// A compiled kinetics formula addressing a local vector by slot.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    program: Vec<Instr>,
    slot_count: usize,
    max_depth: usize,
}

impl CompiledExpression {
    /// Compile bound kinetics once; fails on syntax errors, unknown functions
    /// or slot references outside the bound local vector.
    pub fn compile(bound: &BoundKinetics) -> Result<Self, CompileError> {
        let rpn = to_rpn(&bound.tokens).map_err(|err| CompileError::Syntax {
            message: err.to_string(),
        })?;

        let mut program = Vec::with_capacity(rpn.len());
        let mut depth = 0usize;
        let mut max_depth = 0usize;

        for token in &rpn {
            let instr = match token {
                Token::Number(v) => Instr::Const(*v),
                Token::Var(name) => match slot_of(name) {
                    Some(slot) if slot < bound.slot_count => Instr::Slot(slot),
                    _ => {
                        return Err(CompileError::UnsupportedToken {
                            token: name.clone(),
                        })
                    }
                },
                Token::Unary(Operation::Minus) => Instr::Neg,
                Token::Unary(Operation::Plus) => continue,
                Token::Binary(Operation::Plus) => Instr::Add,
                Token::Binary(Operation::Minus) => Instr::Sub,
                Token::Binary(Operation::Times) => Instr::Mul,
                Token::Binary(Operation::Div) => Instr::Div,
                Token::Binary(Operation::Rem) => Instr::Rem,
                Token::Binary(Operation::Pow) => Instr::Pow,
                Token::Func(name, arity) => function(name, arity.unwrap_or(0))?,
                other => {
                    return Err(CompileError::UnsupportedToken {
                        token: format!("{:?}", other),
                    })
                }
            };

            let (pops, pushes) = instr.stack_effect();
            if depth < pops {
                return Err(CompileError::StackImbalance);
            }
            depth = depth - pops + pushes;
            max_depth = max_depth.max(depth);
            program.push(instr);
        }

        if depth != 1 {
            return Err(CompileError::StackImbalance);
        }

        Ok(CompiledExpression {
            program,
            slot_count: bound.slot_count,
            max_depth,
        })
    }

    /// Number of local-vector slots this program reads.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Evaluate against `local`, using `stack` as scratch space.
    pub fn eval(&self, local: &[f64], stack: &mut Vec<f64>) -> f64 {
        debug_assert_eq!(local.len(), self.slot_count);
        stack.clear();

        for instr in &self.program {
            match *instr {
                Instr::Const(v) => stack.push(v),
                Instr::Slot(k) => stack.push(local[k]),
                Instr::Neg => unary(stack, |a| -a),
                Instr::Call(f) => unary(stack, f),
                Instr::Add => binary(stack, |a, b| a + b),
                Instr::Sub => binary(stack, |a, b| a - b),
                Instr::Mul => binary(stack, |a, b| a * b),
                Instr::Div => binary(stack, |a, b| a / b),
                Instr::Rem => binary(stack, |a, b| a % b),
                Instr::Pow => binary(stack, f64::powf),
                Instr::Atan2 => binary(stack, f64::atan2),
                Instr::Max(n) => variadic(stack, n, f64::max),
                Instr::Min(n) => variadic(stack, n, f64::min),
            }
        }

        stack.pop().unwrap_or(f64::NAN)
    }

    /// A private local vector and stack for repeated evaluation.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator {
            expr: self,
            local: vec![0.0; self.slot_count],
            stack: Vec::with_capacity(self.max_depth),
        }
    }
}

#[inline]
fn unary(stack: &mut Vec<f64>, f: impl Fn(f64) -> f64) {
    let a = stack.pop().unwrap_or(f64::NAN);
    stack.push(f(a));
}

#[inline]
fn binary(stack: &mut Vec<f64>, f: impl Fn(f64, f64) -> f64) {
    let b = stack.pop().unwrap_or(f64::NAN);
    let a = stack.pop().unwrap_or(f64::NAN);
    stack.push(f(a, b));
}

#[inline]
fn variadic(stack: &mut Vec<f64>, n: usize, f: impl Fn(f64, f64) -> f64) {
    let start = stack.len().saturating_sub(n);
    let folded = stack.drain(start..).reduce(f).unwrap_or(f64::NAN);
    stack.push(folded);
}

/// One local vector bound to a compiled expression.
///
/// Each concurrent worker needs its own evaluator; the compiled program is shared.
pub struct Evaluator<'a> {
    expr: &'a CompiledExpression,
    local: Vec<f64>,
    stack: Vec<f64>,
}

impl Evaluator<'_> {
    /// The local vector, one slot per bound input species.
    #[inline]
    pub fn local_mut(&mut self) -> &mut [f64] {
        &mut self.local
    }

    /// Evaluate the formula with the current local vector.
    #[inline]
    pub fn evaluate(&mut self) -> f64 {
        self.expr.eval(&self.local, &mut self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::bind::bind;
    use crate::chem::catalog::SpeciesCatalog;
    use crate::chem::resolve::{resolve, tokenize_kinetics};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn compile_text(
        species: &[&str],
        kinetics: &str,
        params: &[(&str, f64)],
    ) -> Result<CompiledExpression, CompileError> {
        let catalog = SpeciesCatalog::new(species.iter().copied()).unwrap();
        let tokens = tokenize_kinetics(kinetics).unwrap();
        let resolution =
            resolve(&catalog, species[0], species[0], kinetics, &tokens).unwrap();
        let names: Vec<String> = params.iter().map(|(n, _)| n.to_string()).collect();
        let values: BTreeMap<String, f64> =
            params.iter().map(|(n, v)| (n.to_string(), *v)).collect();
        let bound = bind(&catalog, &resolution, &tokens, &names, &values).unwrap();
        CompiledExpression::compile(&bound)
    }

    fn eval_with(expr: &CompiledExpression, local: &[f64]) -> f64 {
        let mut ev = expr.evaluator();
        ev.local_mut().copy_from_slice(local);
        ev.evaluate()
    }

    #[test]
    fn test_first_order_decay() {
        let expr = compile_text(&["A", "B"], "k*A", &[("k", 0.1)]).unwrap();
        assert_eq!(expr.slot_count(), 1);
        assert_relative_eq!(eval_with(&expr, &[10.0]), 1.0);
    }

    #[test]
    fn test_precedence_and_unary() {
        let expr = compile_text(&["A"], "-A*2 + 3*(A-1)", &[]).unwrap();
        assert_relative_eq!(eval_with(&expr, &[2.0]), -1.0);
    }

    #[test]
    fn test_michaelis_menten() {
        let expr = compile_text(
            &["DOC", "O2"],
            "vmax*DOC/(km+DOC)*O2/(ko+O2)",
            &[("vmax", 2.0), ("km", 5.0), ("ko", 1.0)],
        )
        .unwrap();
        let doc = 5.0;
        let o2 = 3.0;
        let expected = 2.0 * doc / (5.0 + doc) * o2 / (1.0 + o2);
        assert_relative_eq!(eval_with(&expr, &[doc, o2]), expected);
    }

    #[test]
    fn test_functions() {
        let expr = compile_text(&["A", "B"], "exp(A) + max(A, B, 7) - atan2(B, A)", &[]).unwrap();
        let (a, b) = (0.5, 2.0);
        assert_relative_eq!(
            eval_with(&expr, &[a, b]),
            a.exp() + 7.0 - b.atan2(a)
        );
    }

    #[test]
    fn test_temperature_correction() {
        let expr = compile_text(
            &["NH4"],
            "k*NH4*theta^(20-20)",
            &[("k", 0.03), ("theta", 1.047)],
        )
        .unwrap();
        assert_relative_eq!(eval_with(&expr, &[100.0]), 3.0);
    }

    #[test]
    fn test_idempotent_evaluation() {
        let expr = compile_text(&["A", "B"], "sqrt(A*B) + A%3", &[]).unwrap();
        let mut ev = expr.evaluator();
        ev.local_mut().copy_from_slice(&[7.0, 2.0]);
        let first = ev.evaluate();
        let second = ev.evaluate();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_evaluator_sees_updated_local_vector() {
        let expr = compile_text(&["A"], "2*A", &[]).unwrap();
        let mut ev = expr.evaluator();
        for v in [1.0, 2.5, -4.0] {
            ev.local_mut()[0] = v;
            assert_eq!(ev.evaluate(), 2.0 * v);
        }
    }

    #[test]
    fn test_unknown_function() {
        let err = compile_text(&["A"], "foo(A)", &[]).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownFunction {
                name: "foo".to_string(),
                arity: 1
            }
        );
    }

    #[test]
    fn test_wrong_arity() {
        let err = compile_text(&["A"], "sqrt(A, A)", &[]).unwrap_err();
        assert!(matches!(err, CompileError::UnknownFunction { arity: 2, .. }));
    }

    #[test]
    fn test_mismatched_parenthesis() {
        let bound = BoundKinetics {
            tokens: vec![Token::LParen, Token::Var("local[0]".to_string())],
            slot_count: 1,
        };
        assert!(matches!(
            CompiledExpression::compile(&bound),
            Err(CompileError::Syntax { .. })
        ));
    }

    #[test]
    fn test_slot_out_of_range_rejected() {
        let bound = BoundKinetics {
            tokens: vec![Token::Var("local[1]".to_string())],
            slot_count: 1,
        };
        assert!(matches!(
            CompiledExpression::compile(&bound),
            Err(CompileError::UnsupportedToken { .. })
        ));
    }

    #[test]
    fn test_division_by_zero_is_non_finite() {
        let expr = compile_text(&["A"], "1/A", &[]).unwrap();
        assert!(!eval_with(&expr, &[0.0]).is_finite());
    }
}
