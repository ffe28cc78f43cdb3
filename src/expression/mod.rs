//! Arithmetic expressions over model attributes.
//!
//! Objectives and constraints are written as text such as
//! `"paraboloid.f_xy"` or `"paraboloid.y-paraboloid.x+15.0"`. They are
//! compiled once into an [`Expr`] tree and evaluated against the model after
//! every execution.

pub mod parser;

pub use parser::{parse_constraint, parse_expression, Relation};

use crate::model::{AttributePath, Model, ModelError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("cannot parse '{text}': {message}")]
    Parse { text: String, message: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: String,
        actual: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Min,
    Max,
}

impl Function {
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "exp" => Function::Exp,
            "log" | "ln" => Function::Ln,
            "log10" => Function::Log10,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "min" => Function::Min,
            "max" => Function::Max,
            _ => return None,
        })
    }

    /// Checks the argument count.
    pub fn check_arity(&self, name: &str, actual: usize) -> Result<(), ExprError> {
        let ok = match self {
            Function::Min | Function::Max => actual >= 1,
            _ => actual == 1,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Function::Min | Function::Max => "at least 1",
            _ => "1",
        };
        Err(ExprError::Arity {
            name: name.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }

    fn apply(&self, args: &[f64]) -> f64 {
        let x = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Ref(AttributePath),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn eval(&self, model: &dyn Model) -> Result<f64, ExprError> {
        Ok(match self {
            Expr::Const(v) => *v,
            Expr::Ref(path) => path.read(model)?,
            Expr::Neg(inner) => -inner.eval(model)?,
            Expr::Binary { op, left, right } => {
                let l = left.eval(model)?;
                let r = right.eval(model)?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                }
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(model))
                    .collect::<Result<Vec<_>, _>>()?;
                function.apply(&values)
            }
        })
    }

    /// Every attribute path the expression reads, in order of appearance.
    pub fn references(&self) -> Vec<&AttributePath> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a AttributePath>) {
        match self {
            Expr::Const(_) => {}
            Expr::Ref(path) => out.push(path),
            Expr::Neg(inner) => inner.collect_references(out),
            Expr::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_references(out)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assembly, Paraboloid, SphereFunctionArray};
    use crate::types::Value;

    fn paraboloid(x: f64, y: f64) -> Assembly {
        let mut top = Assembly::new();
        top.add("paraboloid", Paraboloid::new()).unwrap();
        top.set("paraboloid.x", Value::Float(x)).unwrap();
        top.set("paraboloid.y", Value::Float(y)).unwrap();
        top.execute().unwrap();
        top
    }

    #[test]
    fn test_eval_constraint_text() {
        let top = paraboloid(10.0, -2.0);
        let expr = parse_expression("paraboloid.y-paraboloid.x+15.0").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), 3.0);
    }

    #[test]
    fn test_precedence() {
        let top = paraboloid(2.0, 3.0);
        let expr = parse_expression("1 + paraboloid.x * paraboloid.y ** 2").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), 19.0);

        let expr = parse_expression("-paraboloid.x^2").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), -4.0);

        let expr = parse_expression("(1 - 4) / 2 - 2 - 1").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), -4.5);

        let expr = parse_expression("2 ** 3 ** 2").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), 512.0);
    }

    #[test]
    fn test_functions() {
        let top = paraboloid(4.0, -9.0);
        let expr = parse_expression("sqrt(paraboloid.x) + abs(paraboloid.y) + max(1, 2.5e0, -3)").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), 13.5);

        assert_eq!(
            parse_expression("sqrt(1, 2)").unwrap_err(),
            ExprError::Arity {
                name: "sqrt".to_string(),
                expected: "1".to_string(),
                actual: 2,
            }
        );
        assert_eq!(
            parse_expression("frobnicate(1)").unwrap_err(),
            ExprError::UnknownFunction("frobnicate".to_string())
        );
    }

    #[test]
    fn test_array_elements() {
        let mut top = Assembly::new();
        top.add("comp", SphereFunctionArray::new()).unwrap();
        top.set("comp.x", Value::Array(vec![1.0, 2.0, 3.0])).unwrap();
        let expr = parse_expression("comp.x[0] + comp.x[2]").unwrap();
        assert_eq!(expr.eval(&top).unwrap(), 4.0);

        let refs: Vec<String> = expr.references().iter().map(|p| p.to_string()).collect();
        assert_eq!(refs, vec!["comp.x[0]", "comp.x[2]"]);
    }

    #[test]
    fn test_unknown_reference_fails_at_eval() {
        let top = paraboloid(0.0, 0.0);
        let expr = parse_expression("paraboloid.q + 1").unwrap();
        assert!(matches!(expr.eval(&top), Err(ExprError::Model(_))));
    }
}
