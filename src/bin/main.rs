//! quarry CLI - translate table queries and generate index DDL
//!
//! Usage:
//!   quarry translate --schema <schema.json> --sql <query> [--limit N] [--offset N]
//!   quarry create-table --schema <schema.json> --table <syn id>
//!   quarry diff --schema <schema.json> --existing <names> --table <syn id>
//!
//! The schema file maps table ids to column lists:
//!   { "syn123": [ { "id": 1, "name": "age", "type": "INTEGER" } ] }
//! A bare column list is accepted when `--table` names the table.

use clap::{Parser, Subcommand, ValueEnum};
use quarry::config::Settings;
use quarry::model::{ColumnModel, IdAndVersion, TableType};
use quarry::query::{InMemorySchemaProvider, QueryOrchestrator, QueryRequest, SqlContext};
use quarry::sql::ddl;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "quarry - translate table queries into parameter-bound MySQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a query and print the SQL, binds and select columns as JSON
    Translate {
        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,

        /// Query text, e.g. "select * from syn123"
        #[arg(long)]
        sql: String,

        /// Kind of table the query runs against
        #[arg(long, default_value = "table")]
        table_type: TableTypeArg,

        #[arg(long)]
        offset: Option<i64>,

        #[arg(long)]
        limit: Option<i64>,

        /// Byte budget per page (defaults to the configured value)
        #[arg(long)]
        max_bytes: Option<i64>,

        /// Allow joins, as when building materialized views
        #[arg(long)]
        build: bool,

        /// Also print the row-count query
        #[arg(long)]
        count: bool,
    },

    /// Print the DDL that creates a table's index
    CreateTable {
        #[arg(long)]
        schema: PathBuf,

        /// Table id, e.g. syn123 or syn123.4
        #[arg(long)]
        table: String,

        #[arg(long, default_value = "table")]
        table_type: TableTypeArg,
    },

    /// Print the ALTER that moves existing physical columns to a schema
    Diff {
        #[arg(long)]
        schema: PathBuf,

        /// Comma separated physical column names currently in the table
        #[arg(long, default_value = "")]
        existing: String,

        #[arg(long)]
        table: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TableTypeArg {
    Table,
    EntityView,
    SubmissionView,
    MaterializedView,
}

impl From<TableTypeArg> for TableType {
    fn from(arg: TableTypeArg) -> Self {
        match arg {
            TableTypeArg::Table => TableType::Table,
            TableTypeArg::EntityView => TableType::EntityView,
            TableTypeArg::SubmissionView => TableType::SubmissionView,
            TableTypeArg::MaterializedView => TableType::MaterializedView,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Tables(BTreeMap<String, Vec<ColumnModel>>),
    Columns(Vec<ColumnModel>),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Translate {
            schema,
            sql,
            table_type,
            offset,
            limit,
            max_bytes,
            build,
            count,
        } => {
            let mut request = QueryRequest::new(sql).with_table_type(table_type.into());
            request.offset = offset;
            request.limit = limit;
            request.max_bytes_per_page = max_bytes;
            if build {
                request = request.in_context(SqlContext::Build);
            }
            cmd_translate(&schema, &request, count)
        }
        Commands::CreateTable {
            schema,
            table,
            table_type,
        } => cmd_create_table(&schema, &table, table_type.into()),
        Commands::Diff {
            schema,
            existing,
            table,
        } => cmd_diff(&schema, &existing, &table),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn read_schema(path: &Path) -> Result<SchemaFile, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("reading schema file '{}': {}", path.display(), e))?;
    serde_json::from_str(&source).map_err(|e| format!("parsing schema file '{}': {}", path.display(), e))
}

fn parse_table(table: &str) -> Result<IdAndVersion, String> {
    table.parse::<IdAndVersion>().map_err(|e| e.to_string())
}

/// Columns of one table from either schema file shape.
fn table_columns(path: &Path, table: &IdAndVersion) -> Result<Vec<ColumnModel>, String> {
    match read_schema(path)? {
        SchemaFile::Columns(columns) => Ok(columns),
        SchemaFile::Tables(tables) => {
            for (key, columns) in tables {
                if parse_table(&key)? == *table {
                    return Ok(columns);
                }
            }
            Err(format!("table {} not found in '{}'", table, path.display()))
        }
    }
}

fn cmd_translate(schema: &Path, request: &QueryRequest, count: bool) -> Result<(), String> {
    let settings = Settings::load().map_err(|e| e.to_string())?;

    let mut provider = InMemorySchemaProvider::new();
    match read_schema(schema)? {
        SchemaFile::Tables(tables) => {
            for (key, columns) in tables {
                provider.add_table(parse_table(&key)?, columns);
            }
        }
        SchemaFile::Columns(_) => {
            return Err("translate needs a schema file keyed by table id".to_string());
        }
    }

    let orchestrator =
        QueryOrchestrator::new(provider).with_max_bytes_per_page(settings.query.max_bytes_per_page);
    let translated = orchestrator.translate(request).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&translated).map_err(|e| e.to_string())?;
    println!("{}", json);

    if count {
        match orchestrator.translate_count(request).map_err(|e| e.to_string())? {
            Some(count) => {
                let json = serde_json::to_string_pretty(&count).map_err(|e| e.to_string())?;
                println!("{}", json);
            }
            None => println!("-- aggregate query without grouping returns a single row"),
        }
    }
    Ok(())
}

fn cmd_create_table(schema: &Path, table: &str, table_type: TableType) -> Result<(), String> {
    let id = parse_table(table)?;
    let columns = table_columns(schema, &id)?;

    let create = ddl::create_table_sql(&[], &id, table_type).map_err(|e| e.to_string())?;
    println!("{};", create);
    if let Some(alter) = ddl::alter_table_for_diff(&[], &columns, &id).map_err(|e| e.to_string())? {
        println!("{};", alter);
    }
    println!("{};", ddl::create_status_table_sql(&id));
    println!("{};", ddl::create_current_row_table_sql(&id));
    Ok(())
}

fn cmd_diff(schema: &Path, existing: &str, table: &str) -> Result<(), String> {
    let id = parse_table(table)?;
    let columns = table_columns(schema, &id)?;
    let existing: Vec<String> = existing
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    match ddl::alter_table_for_diff(&existing, &columns, &id).map_err(|e| e.to_string())? {
        Some(alter) => println!("{};", alter),
        None => println!("-- {} is up to date", id),
    }
    Ok(())
}
