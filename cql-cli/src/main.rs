//! CQL CLI - Command-line interface for structured configuration queries

use clap::{Parser, Subcommand};
use cql_core::config::Settings;
use cql_core::{CqlError, QueryConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cql")]
#[command(about = "Structured FROM/SELECT/WHERE queries over configuration documents", long_about = None)]
struct Cli {
    /// Settings file (default: <dir>/.cql.toml when present)
    #[arg(long, global = true, env = "CQL_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .cql.toml with default settings
    Init {
        /// Directory to initialize (default: current directory)
        dir: Option<PathBuf>,
    },

    /// Run a query document over a directory of configuration files
    Query {
        /// Query document (JSON or TOML with from/select/where)
        query: PathBuf,

        /// Directory to search
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Evaluate files on a worker pool
        #[arg(long)]
        parallel: bool,
    },

    /// Show how a query document is interpreted
    Explain {
        /// Query document (JSON or TOML with from/select/where)
        query: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { dir } => cmd_init(dir, cli.json),
        Commands::Query {
            query,
            dir,
            parallel,
        } => cmd_query(&query, &dir, cli.config.as_deref(), parallel, cli.json),
        Commands::Explain { query } => cmd_explain(&query, cli.json),
    };

    if let Err(e) = result {
        if cli.json {
            let code = match &e {
                CqlError::QueryParse { .. } => "query_parse",
                CqlError::ConfigParse(_) | CqlError::ConfigExists(_) => "config",
                CqlError::DirectoryNotFound(_) => "directory_not_found",
                _ => "error",
            };
            eprintln!(
                "{}",
                serde_json::json!({ "code": code, "message": e.to_string() })
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init(dir: Option<PathBuf>, json: bool) -> cql_core::Result<()> {
    use colored::Colorize;

    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let path = Settings::init(&dir)?;

    if json {
        println!("{}", serde_json::json!({ "created": path.display().to_string() }));
    } else {
        println!("{} {}", "Created".green(), path.display());
    }
    Ok(())
}

fn load_settings(dir: &Path, config: Option<&Path>) -> cql_core::Result<Settings> {
    match config {
        Some(path) => Settings::load(path),
        None => Settings::discover(dir),
    }
}

fn cmd_query(
    query: &Path,
    dir: &Path,
    config: Option<&Path>,
    parallel: bool,
    json: bool,
) -> cql_core::Result<()> {
    use colored::Colorize;

    let mut settings = load_settings(dir, config)?;
    if parallel {
        settings.execution.parallel = true;
    }

    let query_config = cql_core::load_query(query)?;
    let result = cql_core::run_query_with(dir, &query_config, &settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!(
            "{}",
            cql_core::format_results_with(&result, &query_config, &settings.output)
        );
        if !result.is_empty() {
            println!(
                "({} matches)",
                result.total_matches().to_string().cyan()
            );
        }
    }
    Ok(())
}

fn cmd_explain(query: &Path, json: bool) -> cql_core::Result<()> {
    use colored::Colorize;

    let config = cql_core::load_query(query)?;
    let predicate = config.compile_where()?;
    let pattern = cql_core::parse_from(&config.from);

    if json {
        let from = match &pattern {
            Some(expr) => serde_json::json!({
                "prefix": expr.prefix,
                "pattern": expr.pattern.to_string(),
                "suffix": expr.suffix,
            }),
            None => serde_json::json!({ "path": config.from }),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "from": from,
                "select": config.select,
                "where": predicate.as_ref().map(|p| p.to_string()),
            }))?
        );
        return Ok(());
    }

    match &pattern {
        Some(expr) => println!(
            "{}: fields of {} matching [{}]{}",
            "From".blue(),
            display_or_root(&expr.prefix),
            expr.pattern,
            if expr.suffix.is_empty() {
                String::new()
            } else {
                format!(" with .{}", expr.suffix)
            }
        ),
        None => println!("{}: {}", "From".blue(), display_or_root(&config.from)),
    }
    println!("{}: {}", "Select".blue(), describe_select(&config));
    match predicate {
        Some(predicate) => {
            println!("{}:", "Where".blue());
            for line in predicate.to_string().lines() {
                println!("  {}", line);
            }
        }
        None => println!("{}: {}", "Where".blue(), "(none)".dimmed()),
    }
    Ok(())
}

fn describe_select(config: &QueryConfig) -> String {
    if config.is_wildcard() {
        "all fields".to_string()
    } else if config.select.is_empty() {
        "(nothing)".to_string()
    } else {
        config.select.join(", ")
    }
}

fn display_or_root(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
