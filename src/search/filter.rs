//! Filter expression parsing and evaluation.
//!
//! The grammar is `path: value` clauses joined with `&&`. Equality on an
//! array-valued leaf means containment; `>`/`>=`/`<`/`<=` compare
//! numerically. Evaluation honors dotted-key precedence because leaf
//! lookup consults the literal top-level key before the nested walk.

use serde_json::{Map, Value};

use crate::error::{KasaneError, Result};
use crate::flatten;

/// Comparison operator of one filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equality, or containment for array leaves.
    Eq,
    /// Numeric greater-than.
    Gt,
    /// Numeric greater-or-equal.
    Gte,
    /// Numeric less-than.
    Lt,
    /// Numeric less-or-equal.
    Lte,
}

/// One `path op value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// Dotted field path.
    pub path: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Raw operand text; typed at evaluation time.
    pub operand: String,
}

/// Parse a `filter_by` expression into clauses.
pub fn parse(expr: &str) -> Result<Vec<FilterClause>> {
    let mut clauses = Vec::new();
    for raw in expr.split("&&") {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Some((path, rest)) = raw.split_once(':') else {
            return Err(KasaneError::invalid_request(format!(
                "Could not parse the filter clause: `{raw}`"
            )));
        };
        let rest = rest.trim();
        let (op, operand) = if let Some(r) = rest.strip_prefix(">=") {
            (FilterOp::Gte, r)
        } else if let Some(r) = rest.strip_prefix("<=") {
            (FilterOp::Lte, r)
        } else if let Some(r) = rest.strip_prefix('>') {
            (FilterOp::Gt, r)
        } else if let Some(r) = rest.strip_prefix('<') {
            (FilterOp::Lt, r)
        } else {
            (FilterOp::Eq, rest)
        };
        let path = path.trim();
        let operand = operand.trim().trim_matches('`');
        if path.is_empty() || operand.is_empty() {
            return Err(KasaneError::invalid_request(format!(
                "Could not parse the filter clause: `{raw}`"
            )));
        }
        clauses.push(FilterClause {
            path: path.to_string(),
            op,
            operand: operand.to_string(),
        });
    }
    if clauses.is_empty() {
        return Err(KasaneError::invalid_request(
            "The filter expression is empty",
        ));
    }
    Ok(clauses)
}

/// Whether a stored (augmented) document satisfies every clause.
pub fn matches_document(doc: &Map<String, Value>, clauses: &[FilterClause]) -> bool {
    clauses.iter().all(|clause| {
        flatten::leaf_values(doc, &clause.path)
            .iter()
            .any(|value| value_matches(value, clause))
    })
}

fn value_matches(value: &Value, clause: &FilterClause) -> bool {
    match value {
        Value::Array(elements) => elements.iter().any(|e| scalar_matches(e, clause)),
        scalar => scalar_matches(scalar, clause),
    }
}

fn scalar_matches(value: &Value, clause: &FilterClause) -> bool {
    match clause.op {
        FilterOp::Eq => match value {
            Value::String(s) => s == &clause.operand,
            Value::Number(n) => clause
                .operand
                .parse::<f64>()
                .map(|rhs| n.as_f64() == Some(rhs))
                .unwrap_or(false),
            Value::Bool(b) => clause.operand.parse::<bool>() == Ok(*b),
            _ => false,
        },
        op => {
            let (Some(lhs), Ok(rhs)) = (value.as_f64(), clause.operand.parse::<f64>()) else {
                return false;
            };
            match op {
                FilterOp::Gt => lhs > rhs,
                FilterOp::Gte => lhs >= rhs,
                FilterOp::Lt => lhs < rhs,
                FilterOp::Lte => lhs <= rhs,
                FilterOp::Eq => unreachable!("handled above"),
            }
        }
    }
}
