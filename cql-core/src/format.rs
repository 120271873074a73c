//! Plain-text table rendering of query results

use crate::config::OutputConfig;
use crate::query::{QueryConfig, QueryResult};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

/// Output for a run without matches
pub const NO_MATCHES: &str = "No matches found in the configurations.\n";

/// Render results with the default column widths
pub fn format_results(result: &QueryResult, config: &QueryConfig) -> String {
    format_results_with(result, config, &OutputConfig::default())
}

/// Render results as a left-justified table: one `file` column, one column
/// per display field, one row per match.
pub fn format_results_with(
    result: &QueryResult,
    config: &QueryConfig,
    layout: &OutputConfig,
) -> String {
    if result.is_empty() {
        return NO_MATCHES.to_string();
    }

    let fields = display_fields(result, config);
    let file_width = layout.file_width;
    let field_width = layout.field_width;
    let mut out = String::new();

    // Header
    let _ = write!(out, "{:<file_width$}", "file");
    for field in &fields {
        let _ = write!(out, "{:<field_width$}", field);
    }
    out.push('\n');

    // Separator
    out.push_str(&"-".repeat(file_width));
    for _ in &fields {
        out.push_str(&"-".repeat(field_width));
    }
    out.push('\n');

    // Rows
    for (_, matches) in result.iter() {
        for m in matches {
            let _ = write!(out, "{:<file_width$}", base_name(&m.file));
            for field in &fields {
                let _ = write!(
                    out,
                    "{:<field_width$}",
                    m.field_value(field).unwrap_or_default()
                );
            }
            out.push('\n');
        }
    }

    out
}

/// Columns to show: the query's selectors, or for `select: ["*"]` every
/// observed match path and `path.child` path, sorted.
pub fn display_fields(result: &QueryResult, config: &QueryConfig) -> Vec<String> {
    if !config.is_wildcard() {
        return config.select.clone();
    }

    let mut fields = BTreeSet::new();
    for (_, matches) in result.iter() {
        for m in matches {
            fields.insert(m.path.clone());
            for child in &m.children {
                fields.insert(format!("{}.{}", m.path, child.path));
            }
        }
    }
    fields.into_iter().collect()
}

fn base_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}
