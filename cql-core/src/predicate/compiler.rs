//! Predicate compilation from WHERE specifications

use super::{ComparisonOp, CompiledPredicate, LogicalOp, Quantifier};
use crate::error::CqlError;
use crate::value::Value;

// Reserved field names in a WHERE specification
const FIELD_AND: &str = "and";
const FIELD_OR: &str = "or";
const FIELD_NOT: &str = "not";
const FIELD_ANY: &str = "any";
const FIELD_ALL: &str = "all";

/// Compile a WHERE specification into an evaluator tree.
///
/// Classification is by reserved field names at the current level, first
/// match wins: `and`/`or`/`not` make a logical node, `any`/`all` a list
/// quantifier, anything else a comparison on the node's first field.
pub fn compile(spec: &Value) -> crate::Result<CompiledPredicate> {
    let fields: Vec<(&str, &Value)> = spec
        .fields()
        .map_err(|_| {
            CqlError::parse(format!(
                "predicate must be a struct, found {}",
                spec.kind()
            ))
        })?
        .collect();

    if fields.is_empty() {
        return Err(CqlError::parse("predicate has no fields"));
    }

    if let Some(&(label, value)) = fields
        .iter()
        .find(|(label, _)| matches!(*label, FIELD_AND | FIELD_OR | FIELD_NOT))
    {
        warn_ignored(&fields, label);
        return compile_logical(label, value);
    }

    if let Some(&(label, value)) = fields
        .iter()
        .find(|(label, _)| matches!(*label, FIELD_ANY | FIELD_ALL))
    {
        warn_ignored(&fields, label);
        return compile_quantifier(label, value);
    }

    let (path, expected) = fields[0];
    warn_ignored(&fields, path);
    Ok(comparison(path, expected))
}

fn compile_logical(label: &str, value: &Value) -> crate::Result<CompiledPredicate> {
    let op = match label {
        FIELD_AND => LogicalOp::And,
        FIELD_OR => LogicalOp::Or,
        _ => {
            return Ok(CompiledPredicate::Logical {
                op: LogicalOp::Not,
                subexprs: vec![compile(value)?],
            })
        }
    };

    let items = value
        .list()
        .map_err(|_| CqlError::parse(format!("`{}` expects a list, found {}", label, value.kind())))?;
    let subexprs = items.map(compile).collect::<crate::Result<Vec<_>>>()?;

    Ok(CompiledPredicate::Logical { op, subexprs })
}

fn compile_quantifier(label: &str, value: &Value) -> crate::Result<CompiledPredicate> {
    let op = if label == FIELD_ANY {
        Quantifier::Any
    } else {
        Quantifier::All
    };

    let fields: Vec<(&str, &Value)> = value
        .fields()
        .map_err(|_| {
            CqlError::parse(format!(
                "`{}` expects a struct naming one list, found {}",
                label,
                value.kind()
            ))
        })?
        .collect();

    let Some(&(path, nested)) = fields.first() else {
        return Err(CqlError::parse(format!("`{}` names no list", label)));
    };
    warn_ignored(&fields, path);

    // A scalar or list condition applies to the element itself
    let predicate = if nested.is_struct() {
        compile(nested)?
    } else {
        comparison("", nested)
    };

    Ok(CompiledPredicate::ListQuantifier {
        path: path.to_string(),
        op,
        predicate: Box::new(predicate),
    })
}

fn comparison(path: &str, expected: &Value) -> CompiledPredicate {
    let op = if expected.is_list() {
        ComparisonOp::In
    } else {
        ComparisonOp::Equal
    };

    CompiledPredicate::Comparison {
        path: path.to_string(),
        op,
        expected: expected.clone(),
    }
}

fn warn_ignored(fields: &[(&str, &Value)], used: &str) {
    if fields.len() > 1 {
        let ignored: Vec<&str> = fields
            .iter()
            .map(|(label, _)| *label)
            .filter(|label| *label != used)
            .collect();
        tracing::warn!(
            used,
            ignored = ?ignored,
            "predicate node has several fields; only one is evaluated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: serde_json::Value) -> Value {
        Value::from(value)
    }

    #[test]
    fn test_compile_scalar_comparison() {
        let pred = compile(&spec(json!({ "env": "prod" }))).unwrap();
        assert_eq!(pred, CompiledPredicate::equal("env", "prod"));
    }

    #[test]
    fn test_compile_list_becomes_in() {
        let pred = compile(&spec(json!({ "env": ["prod", "staging"] }))).unwrap();
        assert_eq!(
            pred,
            CompiledPredicate::is_in("env", vec![Value::from("prod"), Value::from("staging")])
        );
    }

    #[test]
    fn test_compile_uses_only_first_comparison_field() {
        let pred = compile(&spec(json!({ "env": "prod", "port": 80 }))).unwrap();
        assert_eq!(pred, CompiledPredicate::equal("env", "prod"));

        let target = spec(json!({ "env": "prod", "port": 9999 }));
        assert!(pred.evaluate(&target));
    }

    #[test]
    fn test_compile_never_infers_regex() {
        let pred = compile(&spec(json!({ "name": "^api-.*$" }))).unwrap();
        assert!(matches!(
            pred,
            CompiledPredicate::Comparison {
                op: ComparisonOp::Equal,
                ..
            }
        ));
    }

    #[test]
    fn test_compile_logical_nested() {
        let pred = compile(&spec(json!({
            "and": [
                { "env": "prod" },
                { "or": [ { "port": 80 }, { "port": 443 } ] },
                { "not": { "deprecated": true } }
            ]
        })))
        .unwrap();

        assert_eq!(
            pred,
            CompiledPredicate::and(vec![
                CompiledPredicate::equal("env", "prod"),
                CompiledPredicate::or(vec![
                    CompiledPredicate::equal("port", 80i64),
                    CompiledPredicate::equal("port", 443i64),
                ]),
                CompiledPredicate::not(CompiledPredicate::equal("deprecated", true)),
            ])
        );
    }

    #[test]
    fn test_logical_wins_over_quantifier() {
        let pred = compile(&spec(json!({
            "any": { "tags": "x" },
            "not": { "env": "dev" }
        })))
        .unwrap();
        assert!(matches!(
            pred,
            CompiledPredicate::Logical {
                op: LogicalOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_compile_quantifier() {
        let pred = compile(&spec(json!({
            "all": { "listeners": { "tls": true } }
        })))
        .unwrap();
        assert_eq!(
            pred,
            CompiledPredicate::all("listeners", CompiledPredicate::equal("tls", true))
        );
    }

    #[test]
    fn test_compile_quantifier_on_scalar_elements() {
        let pred = compile(&spec(json!({ "any": { "tags": "public" } }))).unwrap();
        assert_eq!(
            pred,
            CompiledPredicate::any("tags", CompiledPredicate::equal("", "public"))
        );
    }

    #[test]
    fn test_compile_errors() {
        assert!(compile(&Value::Int(1)).is_err());
        assert!(compile(&spec(json!({}))).is_err());
        assert!(compile(&spec(json!({ "and": { "env": "prod" } }))).is_err());
        assert!(compile(&spec(json!({ "any": "tags" }))).is_err());
        assert!(compile(&spec(json!({ "all": {} }))).is_err());
        assert!(matches!(
            compile(&spec(json!({ "or": [1] }))),
            Err(CqlError::QueryParse { .. })
        ));
    }
}
