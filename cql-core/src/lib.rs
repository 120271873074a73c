//! CQL Core - structured queries over configuration documents
//!
//! A query names a FROM path (or a `prefix[kind].suffix` pattern), a SELECT
//! list and an optional WHERE predicate. It runs over every document in a
//! directory and produces matches grouped by selector, ready to be rendered
//! as a table.

pub mod config;
pub mod error;
pub mod format;
pub mod from;
pub mod loader;
pub mod predicate;
pub mod query;
pub mod select;
pub mod value;

pub use config::Settings;
pub use error::CqlError;
pub use format::{format_results, format_results_with};
pub use from::{match_pattern, parse_from, Candidate, PatternExpr, TypePattern};
pub use predicate::{compile, CompiledPredicate, ComparisonOp, LogicalOp, Quantifier};
pub use query::{load_query, run_query, run_query_with, QueryConfig, QueryResult};
pub use select::{project, Match};
pub use value::{Value, ValueKind};

/// Result type alias for cql operations
pub type Result<T> = std::result::Result<T, CqlError>;
