//! FROM clause: pattern expressions and candidate matching
//!
//! A FROM string either names one node directly (`service.api`) or a filtered
//! set of sibling nodes under a prefix (`service[struct].name`).

use crate::error::CqlError;
use crate::value::{Value, ValueKind};
use std::fmt;

/// Kind filter inside the brackets of a pattern expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePattern {
    String,
    Int,
    Float,
    /// int or float
    Number,
    Bool,
    Struct,
    List,
    /// `_` or `any`
    Any,
    /// Unrecognized token; matches nothing
    Unknown(String),
}

impl TypePattern {
    pub fn parse(token: &str) -> Self {
        match token {
            "string" => Self::String,
            "int" => Self::Int,
            "float" => Self::Float,
            "number" => Self::Number,
            "bool" => Self::Bool,
            "struct" => Self::Struct,
            "list" => Self::List,
            "_" | "any" => Self::Any,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether a node of `kind` passes this filter.
    ///
    /// `string` also accepts structs so named sub-records can be selected
    /// with `services[string]`.
    pub fn matches(&self, kind: ValueKind) -> bool {
        match self {
            Self::String => matches!(kind, ValueKind::String | ValueKind::Struct),
            Self::Int => kind == ValueKind::Int,
            Self::Float => kind == ValueKind::Float,
            Self::Number => matches!(kind, ValueKind::Int | ValueKind::Float),
            Self::Bool => kind == ValueKind::Bool,
            Self::Struct => kind == ValueKind::Struct,
            Self::List => kind == ValueKind::List,
            Self::Any => true,
            Self::Unknown(_) => false,
        }
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Struct => "struct",
            Self::List => "list",
            Self::Any => "_",
            Self::Unknown(token) => token,
        };
        f.write_str(token)
    }
}

/// Parsed `prefix[pattern].suffix` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternExpr {
    pub prefix: String,
    pub pattern: TypePattern,
    /// Path below each matched field, without the leading dot; may be empty
    pub suffix: String,
}

/// Parse a FROM string as a pattern expression.
///
/// Returns `None` unless the string holds exactly one `[` followed by exactly
/// one `]`, with any suffix starting at a `.`; callers then treat the whole
/// string as a direct lookup path.
pub fn parse_from(expr: &str) -> Option<PatternExpr> {
    let (prefix, rest) = expr.split_once('[')?;
    if prefix.contains(']') || rest.contains('[') {
        return None;
    }
    let (pattern, suffix) = rest.split_once(']')?;
    if suffix.contains(']') {
        return None;
    }
    let suffix = if suffix.is_empty() {
        suffix
    } else {
        suffix.strip_prefix('.')?
    };

    Some(PatternExpr {
        prefix: prefix.to_string(),
        pattern: TypePattern::parse(pattern),
        suffix: suffix.to_string(),
    })
}

/// A node located by the FROM clause, before WHERE filtering
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub label: String,
    /// Root-relative dotted path
    pub path: String,
    pub kind: ValueKind,
    pub value: &'a Value,
}

impl<'a> Candidate<'a> {
    /// Candidate for a directly named node
    pub fn direct(path: &str, value: &'a Value) -> Self {
        Self {
            label: path.rsplit('.').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            kind: value.kind(),
            value,
        }
    }
}

/// Walk the fields under `expr.prefix`, keep those whose kind passes the
/// pattern, and descend into `expr.suffix` when set.
pub fn match_pattern<'a>(root: &'a Value, expr: &PatternExpr) -> crate::Result<Vec<Candidate<'a>>> {
    let base = root
        .lookup(&expr.prefix)
        .ok_or_else(|| CqlError::PathNotFound(expr.prefix.clone()))?;

    let mut candidates = Vec::new();
    for (label, field) in base.fields()? {
        if !expr.pattern.matches(field.kind()) {
            continue;
        }

        let value = if expr.suffix.is_empty() {
            field
        } else {
            match field.lookup(&expr.suffix) {
                Some(v) => v,
                None => continue,
            }
        };

        let path = if expr.prefix.is_empty() {
            label.to_string()
        } else {
            format!("{}.{}", expr.prefix, label)
        };

        candidates.push(Candidate {
            label: label.to_string(),
            path,
            kind: value.kind(),
            value,
        });
    }

    Ok(candidates)
}

/// Resolve a FROM string against a document: pattern expressions go through
/// [`match_pattern`], anything else is a direct lookup yielding at most one
/// candidate.
pub fn resolve<'a>(root: &'a Value, from: &str) -> crate::Result<Vec<Candidate<'a>>> {
    match parse_from(from) {
        Some(expr) => match_pattern(root, &expr),
        None => root
            .lookup(from)
            .map(|value| vec![Candidate::direct(from, value)])
            .ok_or_else(|| CqlError::PathNotFound(from.to_string())),
    }
}
