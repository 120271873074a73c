//! SELECT clause: projection of candidates into result records

use crate::value::{Value, ValueKind};
use serde::Serialize;

/// Wildcard selector projecting the candidate itself
pub const WILDCARD: &str = "*";

/// A located, typed, stringified query result node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub label: String,
    /// Dotted path; children carry their own label
    pub path: String,
    /// Source document
    pub file: String,
    pub kind: ValueKind,
    /// Owned copy of the projected node; `None` on children, whose values
    /// are already inside their parent's copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Textual form shown in result tables
    pub display: String,
    /// One entry per struct field, recursively; empty for other kinds
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Match>,
}

impl Match {
    /// Build a match for `value`, materializing struct fields as children.
    pub fn extract(value: &Value, path: &str, file: &str) -> Self {
        let mut m = Self::extract_node(value, path, file);
        m.value = Some(value.clone());
        m
    }

    fn extract_node(value: &Value, path: &str, file: &str) -> Self {
        let children = match value {
            Value::Struct(fields) => fields
                .iter()
                .map(|(label, field)| Self::extract_node(field, label, file))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            label: path.rsplit('.').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            file: file.to_string(),
            kind: value.kind(),
            value: None,
            display: stringify(value),
            children,
        }
    }

    /// Displayed value for a table column.
    ///
    /// `field` may be this match's own path, a child path, the child path
    /// qualified with this match's path (`service.a.name`), or a dotted path
    /// through nested children.
    pub fn field_value(&self, field: &str) -> Option<&str> {
        if field == WILDCARD || field == self.path {
            return Some(&self.display);
        }
        let relative = field
            .strip_prefix(self.path.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(field);
        self.child_value(relative)
    }

    fn child_value(&self, field: &str) -> Option<&str> {
        for child in &self.children {
            if child.path == field {
                return Some(&child.display);
            }
            let nested = field
                .strip_prefix(child.path.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| child.child_value(rest));
            if nested.is_some() {
                return nested;
            }
        }
        None
    }
}

/// Project `node` through one selector.
///
/// `*` yields the node itself under `path`; a named selector is looked up on
/// the node and yields nothing when absent.
pub fn project(node: &Value, selector: &str, path: &str, file: &str) -> Option<Match> {
    if selector == WILDCARD {
        return Some(Match::extract(node, path, file));
    }
    node.lookup(selector)
        .map(|value| Match::extract(value, selector, file))
}

/// Table form of a value: strings bare, floats fixed-point, structs as
/// `label: value` pairs, lists bracketed.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format!("{:.6}", x),
        Value::String(s) => s.clone(),
        Value::Struct(fields) => fields
            .iter()
            .map(|(label, field)| format!("{}: {}", label, field))
            .collect::<Vec<_>>()
            .join(", "),
        Value::List(items) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wildcard_projects_struct_children() {
        let node = Value::from(json!({ "name": "svc", "port": 8080 }));
        let m = project(&node, WILDCARD, "service.svc", "svc.json").unwrap();

        assert_eq!(m.path, "service.svc");
        assert_eq!(m.label, "svc");
        assert_eq!(m.kind, ValueKind::Struct);
        assert_eq!(m.display, r#"name: "svc", port: 8080"#);

        let children: Vec<(&str, &str)> = m
            .children
            .iter()
            .map(|c| (c.path.as_str(), c.display.as_str()))
            .collect();
        assert_eq!(children, vec![("name", "svc"), ("port", "8080")]);
        assert!(m.children.iter().all(|c| c.file == "svc.json"));
    }

    #[test]
    fn test_only_top_level_match_holds_value() {
        let node = Value::from(json!({ "name": "svc", "limits": { "cpu": "500m" } }));
        let m = project(&node, WILDCARD, "service.svc", "svc.json").unwrap();

        assert_eq!(m.value.as_ref(), Some(&node));
        assert!(m.children.iter().all(|c| c.value.is_none()));
        assert!(m.children[1].children.iter().all(|c| c.value.is_none()));

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["value"]["limits"]["cpu"], "500m");
        assert!(json["children"][0].get("value").is_none());
        assert!(json["children"][1]["children"][0].get("value").is_none());
        assert_eq!(json["children"][1]["children"][0]["display"], "500m");
    }

    #[test]
    fn test_named_selector() {
        let node = Value::from(json!({ "spec": { "replicas": 3 } }));
        let m = project(&node, "spec.replicas", "deploy", "d.json").unwrap();
        assert_eq!(m.path, "spec.replicas");
        assert_eq!(m.label, "replicas");
        assert_eq!(m.display, "3");
        assert!(m.children.is_empty());
    }

    #[test]
    fn test_missing_selector_yields_nothing() {
        let node = Value::from(json!({ "name": "svc" }));
        assert!(project(&node, "port", "svc", "svc.json").is_none());
    }

    #[test]
    fn test_stringify_scalars_and_lists() {
        assert_eq!(stringify(&Value::Float(1.5)), "1.500000");
        assert_eq!(stringify(&Value::Bool(false)), "false");
        assert_eq!(stringify(&Value::Null), "null");
        assert_eq!(
            stringify(&Value::from(json!(["a", 1, { "k": true }]))),
            r#"["a", 1, {k: true}]"#
        );
    }

    #[test]
    fn test_lists_have_no_children() {
        let node = Value::from(json!({ "hosts": [{ "name": "h1" }] }));
        let m = project(&node, "hosts", "x", "f.json").unwrap();
        assert_eq!(m.kind, ValueKind::List);
        assert!(m.children.is_empty());
    }

    #[test]
    fn test_field_value_resolution() {
        let node = Value::from(json!({
            "name": "svc",
            "limits": { "cpu": "500m" }
        }));
        let m = project(&node, WILDCARD, "service.a", "f.json").unwrap();

        assert_eq!(m.field_value("service.a"), Some(m.display.as_str()));
        assert_eq!(m.field_value("name"), Some("svc"));
        assert_eq!(m.field_value("service.a.name"), Some("svc"));
        assert_eq!(m.field_value("limits.cpu"), Some("500m"));
        assert_eq!(m.field_value("service.a.limits.cpu"), Some("500m"));
        assert_eq!(m.field_value("missing"), None);
    }
}
