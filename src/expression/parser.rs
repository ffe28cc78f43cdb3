use super::{BinaryOp, ExprError, Expr, Function};
use crate::model::AttributePath;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::sync::LazyLock;

#[derive(Parser)]
#[grammar = "expression/grammar.pest"]
struct ExpressionParser;

static PRATT_PARSER: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
        .op(Op::prefix(Rule::neg))
        .op(Op::infix(Rule::pow, Assoc::Right))
});

/// Relational operator of a constraint such as `"a < b"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

type ParseResult<T> = Result<T, ExprError>;

/// Parses a plain arithmetic expression.
pub fn parse_expression(text: &str) -> ParseResult<Expr> {
    let mut pairs = ExpressionParser::parse(Rule::objective, text).map_err(|e| syntax(text, e))?;
    let root = pairs.next().ok_or_else(|| empty(text))?;
    let expr = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| empty(text))?;
    build_expr(expr.into_inner())
}

/// Parses a constraint: an expression optionally compared to another one.
pub fn parse_constraint(text: &str) -> ParseResult<(Expr, Option<(Relation, Expr)>)> {
    let mut pairs = ExpressionParser::parse(Rule::constraint, text).map_err(|e| syntax(text, e))?;
    let root = pairs.next().ok_or_else(|| empty(text))?;

    let mut lhs = None;
    let mut relation = None;
    let mut rhs = None;
    for inner in root.into_inner() {
        match inner.as_rule() {
            Rule::expr if lhs.is_none() => lhs = Some(build_expr(inner.into_inner())?),
            Rule::expr => rhs = Some(build_expr(inner.into_inner())?),
            Rule::rel_op => relation = Some(parse_relation(inner.as_str())),
            _ => {}
        }
    }

    let lhs = lhs.ok_or_else(|| empty(text))?;
    Ok((lhs, relation.zip(rhs)))
}

fn parse_relation(op: &str) -> Relation {
    match op {
        "<=" => Relation::LessEqual,
        ">=" => Relation::GreaterEqual,
        "<" => Relation::Less,
        _ => Relation::Greater,
    }
}

fn build_expr(pairs: Pairs<Rule>) -> ParseResult<Expr> {
    PRATT_PARSER
        .map_primary(build_primary)
        .map_prefix(|_op, rhs| Ok(Expr::Neg(Box::new(rhs?))))
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                _ => BinaryOp::Pow,
            };
            Ok(Expr::Binary {
                op,
                left: Box::new(lhs?),
                right: Box::new(rhs?),
            })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Const)
            .map_err(|e| ExprError::Parse {
                text: pair.as_str().to_string(),
                message: e.to_string(),
            }),
        Rule::reference => {
            let text = pair.as_str();
            AttributePath::parse(text)
                .map(Expr::Ref)
                .map_err(|message| ExprError::Parse {
                    text: text.to_string(),
                    message,
                })
        }
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
            let function =
                Function::lookup(&name).ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;
            let args = inner
                .map(|arg| build_expr(arg.into_inner()))
                .collect::<ParseResult<Vec<_>>>()?;
            function.check_arity(&name, args.len())?;
            Ok(Expr::Call { function, args })
        }
        Rule::expr => build_expr(pair.into_inner()),
        other => Err(ExprError::Parse {
            text: pair.as_str().to_string(),
            message: format!("unexpected {:?}", other),
        }),
    }
}

fn syntax(text: &str, err: pest::error::Error<Rule>) -> ExprError {
    ExprError::Parse {
        text: text.to_string(),
        message: err.variant.message().to_string(),
    }
}

fn empty(text: &str) -> ExprError {
    ExprError::Parse {
        text: text.to_string(),
        message: "empty expression".to_string(),
    }
}
