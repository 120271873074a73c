//! WHERE clause: compiled predicate trees
//!
//! A WHERE specification is itself a [`Value`]. [`compile`] turns it into a
//! [`CompiledPredicate`] once per run; the tree holds no state and can be
//! evaluated against any number of candidates, from any thread.

mod compiler;
mod evaluator;

pub use compiler::compile;
pub use evaluator::structurally_equal;

use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Type-directed equality; structs compare as subsets
    Equal,
    /// Regular expression match on strings
    Regex,
    /// Membership in a list
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

/// Executable evaluator tree
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledPredicate {
    Logical {
        op: LogicalOp,
        subexprs: Vec<CompiledPredicate>,
    },
    Comparison {
        path: String,
        op: ComparisonOp,
        expected: Value,
    },
    ListQuantifier {
        path: String,
        op: Quantifier,
        predicate: Box<CompiledPredicate>,
    },
}

impl CompiledPredicate {
    pub fn and(subexprs: Vec<CompiledPredicate>) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            subexprs,
        }
    }

    pub fn or(subexprs: Vec<CompiledPredicate>) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            subexprs,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(subexpr: CompiledPredicate) -> Self {
        Self::Logical {
            op: LogicalOp::Not,
            subexprs: vec![subexpr],
        }
    }

    pub fn equal(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self::Comparison {
            path: path.into(),
            op: ComparisonOp::Equal,
            expected: expected.into(),
        }
    }

    /// Regex comparison. The compiler never infers this operator, so this
    /// constructor is the only way to get one.
    pub fn regex(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Comparison {
            path: path.into(),
            op: ComparisonOp::Regex,
            expected: Value::String(pattern.into()),
        }
    }

    pub fn is_in(path: impl Into<String>, expected: Vec<Value>) -> Self {
        Self::Comparison {
            path: path.into(),
            op: ComparisonOp::In,
            expected: Value::List(expected),
        }
    }

    pub fn any(path: impl Into<String>, predicate: CompiledPredicate) -> Self {
        Self::ListQuantifier {
            path: path.into(),
            op: Quantifier::Any,
            predicate: Box::new(predicate),
        }
    }

    pub fn all(path: impl Into<String>, predicate: CompiledPredicate) -> Self {
        Self::ListQuantifier {
            path: path.into(),
            op: Quantifier::All,
            predicate: Box::new(predicate),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Self::Logical { op, subexprs } => {
                let name = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                    LogicalOp::Not => "not",
                };
                writeln!(f, "{}{}", indent, name)?;
                for sub in subexprs {
                    sub.write_tree(f, depth + 1)?;
                }
                Ok(())
            }
            Self::Comparison { path, op, expected } => {
                let symbol = match op {
                    ComparisonOp::Equal => "=",
                    ComparisonOp::Regex => "=~",
                    ComparisonOp::In => "in",
                };
                writeln!(f, "{}{} {} {}", indent, display_path(path), symbol, expected)
            }
            Self::ListQuantifier { path, op, predicate } => {
                let name = match op {
                    Quantifier::Any => "any",
                    Quantifier::All => "all",
                };
                writeln!(f, "{}{} {}", indent, name, display_path(path))?;
                predicate.write_tree(f, depth + 1)
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "@"
    } else {
        path
    }
}

/// Indented tree, one node per line
impl fmt::Display for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
