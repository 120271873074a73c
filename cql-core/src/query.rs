//! Query documents, execution and result aggregation

use crate::config::Settings;
use crate::error::CqlError;
use crate::from::{self, Candidate};
use crate::loader;
use crate::predicate::{self, CompiledPredicate};
use crate::select::{self, Match, WILDCARD};
use crate::value::Value;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::Path;

/// A FROM/SELECT/WHERE query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryConfig {
    /// Direct path or `prefix[pattern].suffix` expression
    pub from: String,
    /// Field paths, or the single wildcard `*`
    pub select: Vec<String>,
    /// Predicate specification; `None` keeps every candidate
    pub where_clause: Option<Value>,
}

impl QueryConfig {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    pub fn with_select<I, S>(mut self, select: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = select.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_where(mut self, spec: Value) -> Self {
        self.where_clause = Some(spec);
        self
    }

    /// Build a query from a loaded query document with `from`, `select` and
    /// `where` keys.
    pub fn from_value(doc: &Value) -> crate::Result<Self> {
        if !doc.is_struct() {
            return Err(CqlError::parse(format!(
                "query document must be a struct, found {}",
                doc.kind()
            )));
        }

        let from = match doc.field("from") {
            Some(value) => value
                .as_string()
                .map_err(|_| CqlError::parse("`from` must be a string"))?
                .to_string(),
            None => String::new(),
        };

        let select = match doc.field("select") {
            Some(value) => value
                .list()
                .map_err(|_| CqlError::parse("`select` must be a list"))?
                .map(|item| {
                    item.as_string()
                        .map(str::to_string)
                        .map_err(|_| CqlError::parse("`select` entries must be strings"))
                })
                .collect::<crate::Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let where_clause = match doc.field("where") {
            None => None,
            Some(Value::Struct(fields)) if fields.is_empty() => None,
            Some(spec @ Value::Struct(_)) => Some(spec.clone()),
            Some(other) => {
                return Err(CqlError::parse(format!(
                    "`where` must be a struct, found {}",
                    other.kind()
                )))
            }
        };

        if select.is_empty() {
            tracing::warn!("query selects no fields");
        } else if select.len() > 1 && select.iter().any(|s| s == WILDCARD) {
            tracing::warn!("`*` mixed with named selectors is shown as a plain column");
        }

        Ok(Self {
            from,
            select,
            where_clause,
        })
    }

    /// Compile the WHERE clause, if any
    pub fn compile_where(&self) -> crate::Result<Option<CompiledPredicate>> {
        self.where_clause.as_ref().map(predicate::compile).transpose()
    }

    /// True when the table shows every observed field
    pub fn is_wildcard(&self) -> bool {
        self.select.len() == 1 && self.select[0] == WILDCARD
    }
}

/// Load a query document (JSON or TOML)
pub fn load_query(path: &Path) -> crate::Result<QueryConfig> {
    let doc = loader::load(path).map_err(|e| CqlError::parse(e.to_string()))?;
    QueryConfig::from_value(&doc)
}

/// Matches grouped by selector, in first-append order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    groups: Vec<(String, Vec<Match>)>,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match under `selector`
    pub fn push(&mut self, selector: &str, m: Match) {
        match self.groups.iter_mut().find(|(name, _)| name == selector) {
            Some((_, matches)) => matches.push(m),
            None => self.groups.push((selector.to_string(), vec![m])),
        }
    }

    /// Append every group of `other`, keeping its order
    pub fn merge(&mut self, other: QueryResult) {
        for (selector, matches) in other.groups {
            for m in matches {
                self.push(&selector, m);
            }
        }
    }

    pub fn get(&self, selector: &str) -> Option<&[Match]> {
        self.groups
            .iter()
            .find(|(name, _)| name == selector)
            .map(|(_, matches)| matches.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Match])> {
        self.groups
            .iter()
            .map(|(name, matches)| (name.as_str(), matches.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of matches across selectors
    pub fn total_matches(&self) -> usize {
        self.groups.iter().map(|(_, matches)| matches.len()).sum()
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (selector, matches) in &self.groups {
            map.serialize_entry(selector, matches)?;
        }
        map.end()
    }
}

/// Run a query over every document under `directory` with default settings
pub fn run_query(directory: &Path, config: &QueryConfig) -> crate::Result<QueryResult> {
    run_query_with(directory, config, &Settings::default())
}

/// Run a query over every document under `directory`.
///
/// Only an invalid WHERE clause or an unreadable directory fail the run;
/// documents that cannot be loaded or lack the FROM path are skipped.
pub fn run_query_with(
    directory: &Path,
    config: &QueryConfig,
    settings: &Settings,
) -> crate::Result<QueryResult> {
    let predicate = config.compile_where()?;
    let files = loader::list_files(directory, &settings.discovery)?;

    tracing::info!(
        files = files.len(),
        from = %config.from,
        parallel = settings.execution.parallel,
        "running query"
    );

    let partials: Vec<QueryResult> = if settings.execution.parallel {
        files
            .par_iter()
            .map(|file| query_file(file, config, predicate.as_ref()))
            .collect::<crate::Result<_>>()?
    } else {
        files
            .iter()
            .map(|file| query_file(file, config, predicate.as_ref()))
            .collect::<crate::Result<_>>()?
    };

    let mut result = QueryResult::new();
    for partial in partials {
        result.merge(partial);
    }

    tracing::info!(matches = result.total_matches(), "query finished");
    Ok(result)
}

/// Evaluate the query against one document
fn query_file(
    path: &Path,
    config: &QueryConfig,
    predicate: Option<&CompiledPredicate>,
) -> crate::Result<QueryResult> {
    let mut result = QueryResult::new();
    if config.from.is_empty() {
        return Ok(result);
    }

    let Some(root) = skip_recoverable(loader::load(path), path)? else {
        return Ok(result);
    };
    let Some(candidates) = skip_recoverable(from::resolve(&root, &config.from), path)? else {
        return Ok(result);
    };

    let file = path.to_string_lossy();
    let mut kept = 0usize;
    for Candidate {
        path: candidate_path,
        value,
        ..
    } in candidates
    {
        if let Some(predicate) = predicate {
            if !predicate.evaluate(value) {
                continue;
            }
        }
        kept += 1;

        for selector in &config.select {
            if let Some(m) = select::project(value, selector, &candidate_path, &file) {
                result.push(selector, m);
            }
        }
    }

    tracing::debug!(file = %path.display(), kept, "document evaluated");
    Ok(result)
}

/// Turn an error that only excludes this document into `None`; any other
/// error fails the whole run.
fn skip_recoverable<T>(outcome: crate::Result<T>, path: &Path) -> crate::Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(e @ CqlError::Load { .. }) => {
            tracing::warn!(error = %e, "skipping document");
            Ok(None)
        }
        Err(e) if e.is_recoverable() => {
            tracing::debug!(file = %path.display(), error = %e, "no candidates");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_from_value_reads_all_clauses() {
        let doc = Value::from(json!({
            "from": "service[struct]",
            "select": ["name", "port"],
            "where": { "env": "prod" }
        }));
        let config = QueryConfig::from_value(&doc).unwrap();
        assert_eq!(config.from, "service[struct]");
        assert_eq!(config.select, vec!["name", "port"]);
        assert_eq!(config.where_clause, Some(Value::from(json!({ "env": "prod" }))));
    }

    #[test]
    fn test_from_value_empty_where_is_none() {
        let doc = Value::from(json!({ "from": "a", "select": ["*"], "where": {} }));
        let config = QueryConfig::from_value(&doc).unwrap();
        assert!(config.where_clause.is_none());
        assert!(config.is_wildcard());
    }

    #[test]
    fn test_from_value_rejects_malformed() {
        let bad = [
            json!({ "from": 1 }),
            json!({ "from": "a", "select": "name" }),
            json!({ "from": "a", "select": [1] }),
            json!({ "from": "a", "where": ["x"] }),
            json!(["not", "a", "struct"]),
        ];
        for doc in bad {
            assert!(matches!(
                QueryConfig::from_value(&Value::from(doc)),
                Err(CqlError::QueryParse { .. })
            ));
        }
    }

    #[test]
    fn test_load_query_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.toml");
        fs::write(
            &path,
            "from = \"service[string].name\"\nselect = [\"*\"]\n\n[where]\nname = \"x\"\n",
        )
        .unwrap();
        let config = load_query(&path).unwrap();
        assert_eq!(config.from, "service[string].name");
        assert!(config.is_wildcard());
        assert!(config.compile_where().unwrap().is_some());
    }

    #[test]
    fn test_load_query_unreadable_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.json");
        fs::write(&path, "{ broken").unwrap();
        assert!(matches!(load_query(&path), Err(CqlError::QueryParse { .. })));
    }

    #[test]
    fn test_result_groups_keep_order() {
        let m = |path: &str| select::Match::extract(&Value::Int(1), path, "f.json");
        let mut result = QueryResult::new();
        result.push("port", m("port"));
        result.push("name", m("name"));
        result.push("port", m("port"));

        let selectors: Vec<&str> = result.iter().map(|(s, _)| s).collect();
        assert_eq!(selectors, vec!["port", "name"]);
        assert_eq!(result.get("port").unwrap().len(), 2);
        assert_eq!(result.total_matches(), 3);

        let mut merged = QueryResult::new();
        merged.push("name", m("name"));
        merged.merge(result);
        let selectors: Vec<&str> = merged.iter().map(|(s, _)| s).collect();
        assert_eq!(selectors, vec!["name", "port"]);
        assert_eq!(merged.get("name").unwrap().len(), 2);
    }

    #[test]
    fn test_result_serializes_as_map() {
        let mut result = QueryResult::new();
        result.push("port", select::Match::extract(&Value::Int(80), "port", "a.json"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["port"][0]["display"], "80");
        assert_eq!(json["port"][0]["kind"], "int");
    }

    #[test]
    fn test_skip_recoverable_only_skips_per_document_errors() {
        let path = Path::new("svc.json");
        let missing: crate::Result<i32> = Err(CqlError::PathNotFound("service".to_string()));
        assert!(skip_recoverable(missing, path).unwrap().is_none());

        let broken: crate::Result<i32> = Err(CqlError::Load {
            path: path.to_path_buf(),
            message: "expected value".to_string(),
        });
        assert!(skip_recoverable(broken, path).unwrap().is_none());

        let fatal: crate::Result<i32> = Err(CqlError::parse("bad where"));
        assert!(matches!(
            skip_recoverable(fatal, path),
            Err(CqlError::QueryParse { .. })
        ));
        assert_eq!(skip_recoverable(Ok(3), path).unwrap(), Some(3));
    }

    #[test]
    fn test_query_file_skips_broken_and_unrelated_documents() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        let other = dir.path().join("other.json");
        fs::write(&broken, "{ nope").unwrap();
        fs::write(&other, r#"{"database": {"port": 5432}}"#).unwrap();

        let config = QueryConfig::new("service[struct]").with_select(["port"]);
        assert!(query_file(&broken, &config, None).unwrap().is_empty());
        assert!(query_file(&other, &config, None).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_where_aborts_before_walking() {
        let config = QueryConfig::new("a").with_where(Value::Int(3));
        let err = run_query(Path::new("/definitely/not/here"), &config).unwrap_err();
        assert!(matches!(err, CqlError::QueryParse { .. }));
    }
}
