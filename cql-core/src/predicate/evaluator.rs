//! Predicate evaluation against candidate nodes

use super::{ComparisonOp, CompiledPredicate, LogicalOp, Quantifier};
use crate::value::Value;
use regex::Regex;

impl CompiledPredicate {
    /// Evaluate against `target`. Missing paths and kind mismatches are
    /// `false`, never errors.
    pub fn evaluate(&self, target: &Value) -> bool {
        match self {
            Self::Logical { op, subexprs } => match op {
                LogicalOp::And => subexprs.iter().all(|expr| expr.evaluate(target)),
                LogicalOp::Or => subexprs.iter().any(|expr| expr.evaluate(target)),
                LogicalOp::Not => match subexprs.as_slice() {
                    [only] => !only.evaluate(target),
                    _ => false,
                },
            },
            Self::Comparison { path, op, expected } => {
                let Some(actual) = target.lookup(path) else {
                    return false;
                };
                match op {
                    ComparisonOp::Equal => compare_equal(actual, expected),
                    ComparisonOp::Regex => compare_regex(actual, expected),
                    ComparisonOp::In => compare_in(actual, expected),
                }
            }
            Self::ListQuantifier {
                path,
                op,
                predicate,
            } => {
                let Some(Value::List(items)) = target.lookup(path) else {
                    return false;
                };
                match op {
                    Quantifier::Any => items.iter().any(|item| predicate.evaluate(item)),
                    // Vacuously true on an empty list
                    Quantifier::All => items.iter().all(|item| predicate.evaluate(item)),
                }
            }
        }
    }
}

/// Type-directed equality. Lists compare pairwise in order; structs compare
/// as a subset: every expected field must exist and match, extra target
/// fields are ignored.
fn compare_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::List(items), Value::List(wanted)) => {
            items.len() == wanted.len()
                && items
                    .iter()
                    .zip(wanted)
                    .all(|(item, want)| compare_equal(item, want))
        }
        (Value::Struct(_), Value::Struct(wanted)) => wanted.iter().all(|(label, want)| {
            actual
                .field(label)
                .is_some_and(|field| compare_equal(field, want))
        }),
        _ => scalar_equal(actual, expected),
    }
}

fn compare_regex(actual: &Value, pattern: &Value) -> bool {
    let (Value::String(text), Value::String(pattern)) = (actual, pattern) else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::debug!(pattern = %pattern, error = %e, "invalid regex in predicate");
            false
        }
    }
}

/// Membership. A list target matches when any of its elements equals any
/// expected element; any other target must equal one expected element.
fn compare_in(actual: &Value, expected: &Value) -> bool {
    let Value::List(options) = expected else {
        return false;
    };
    match actual {
        Value::List(items) => items
            .iter()
            .any(|item| options.iter().any(|option| structurally_equal(item, option))),
        _ => options
            .iter()
            .any(|option| structurally_equal(actual, option)),
    }
}

/// Full structural equality: numbers compare by value across int/float,
/// structs must have the same fields regardless of order.
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(left), Value::List(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(l, r)| structurally_equal(l, r))
        }
        (Value::Struct(left), Value::Struct(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(label, l)| b.field(label).is_some_and(|r| structurally_equal(l, r)))
        }
        _ => scalar_equal(a, b),
    }
}

/// Exact scalar equality; no float tolerance
fn scalar_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        _ => false,
    }
}
