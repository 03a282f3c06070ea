use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mediadex_config::DatabaseConfig;
use mediadex_core::{ContentKind, FieldDescriptor, FieldKind, MediaRecord, Value};
use mediadex_search::{PageView, SearchIndex, SearchQuery};
use mediadex_store::{MediaStore, Row, SaveOutcome, StoreStatus};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "MEDIADEX_LOG";

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "mediadex", version = PACKAGE_VERSION)]
#[command(about = "Index, search and manage stored media records")]
struct Cli {
    /// YAML settings file; DB_* environment variables override it. Without
    /// it, settings come from the environment alone.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log generated statements and store activity to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Output format for records and pages.
    #[arg(long, global = true, default_value = "text")]
    format: CliOutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the media table if it does not exist.
    Init,
    /// Show whether the media table exists and how many records it holds.
    Status,
    /// Store one media record unless its unique id is already known.
    Add(AddArgs),
    /// Print the record with the given unique id.
    Get(GetArgs),
    /// Print every row of the media table.
    List(ListArgs),
    /// Print the first listed column across all rows.
    Col(ColArgs),
    /// Search media names and print one page of matches.
    Search(SearchArgs),
    /// Delete rows matching every condition.
    Delete(DeleteArgs),
    /// Update rows matching every condition.
    Update(UpdateArgs),
    /// Add, drop, rename or retype a column of the media table.
    Column(ColumnArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Display name of the media file.
    #[arg(long)]
    name: String,
    /// Handle used to send the file again.
    #[arg(long)]
    file_ref: String,
    /// Stable identifier of the file.
    #[arg(long)]
    unique_id: String,
    /// `document` or `video`.
    #[arg(long)]
    kind: String,
}

#[derive(Debug, Args)]
struct GetArgs {
    unique_id: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Column to sort by; repeat for secondary keys.
    #[arg(long = "order-by")]
    order_by: Vec<String>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
}

#[derive(Debug, Args)]
struct ColArgs {
    /// Columns to project; values of the first one are printed.
    #[arg(required = true)]
    columns: Vec<String>,
    /// Column to sort by; repeat for secondary keys.
    #[arg(long = "order-by")]
    order_by: Vec<String>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Terms that must all appear in the media name.
    #[arg(required = true)]
    terms: Vec<String>,
    /// Zero-based page; out-of-range values show the nearest page.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    page: i64,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Condition as `column=value`; repeat to combine with AND.
    #[arg(long = "where", required = true)]
    conditions: Vec<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Assignment as `column=value`; repeat for several columns.
    #[arg(long = "set", required = true)]
    changes: Vec<String>,
    /// Condition as `column=value`; repeat to combine with AND.
    #[arg(long = "where", required = true)]
    conditions: Vec<String>,
}

#[derive(Debug, Args)]
struct ColumnArgs {
    #[command(subcommand)]
    operation: ColumnOperation,
}

#[derive(Debug, Subcommand)]
enum ColumnOperation {
    /// Add a column.
    Add(ColumnAddArgs),
    /// Drop a column.
    Drop(ColumnDropArgs),
    /// Rename a column.
    Rename(ColumnRenameArgs),
    /// Change a column's type (PostgreSQL only).
    Alter(ColumnAlterArgs),
}

#[derive(Debug, Args)]
struct FieldArgs {
    /// char, varchar, text, int or float.
    kind: String,
    /// Type size; 0 leaves it unbounded.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    size: i64,
    /// Reject NULL values.
    #[arg(long)]
    not_null: bool,
}

#[derive(Debug, Args)]
struct ColumnAddArgs {
    name: String,
    #[command(flatten)]
    field: FieldArgs,
    /// Reject duplicate values.
    #[arg(long)]
    unique: bool,
}

#[derive(Debug, Args)]
struct ColumnDropArgs {
    name: String,
}

#[derive(Debug, Args)]
struct ColumnRenameArgs {
    old: String,
    new: String,
}

#[derive(Debug, Args)]
struct ColumnAlterArgs {
    name: String,
    #[command(flatten)]
    field: FieldArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|config| {
        let ctx = Context {
            config,
            format: cli.format,
        };
        match cli.command {
            Command::Init => run_init(&ctx),
            Command::Status => run_status(&ctx),
            Command::Add(args) => run_add(&ctx, args),
            Command::Get(args) => run_get(&ctx, args),
            Command::List(args) => run_list(&ctx, args),
            Command::Col(args) => run_col(&ctx, args),
            Command::Search(args) => run_search(&ctx, args),
            Command::Delete(args) => run_delete(&ctx, args),
            Command::Update(args) => run_update(&ctx, args),
            Command::Column(args) => run_column(&ctx, args),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Context {
    config: DatabaseConfig,
    format: CliOutputFormat,
}

impl Context {
    fn store(&self) -> Result<MediaStore, String> {
        MediaStore::open(&self.config).map_err(|e| format!("Failed to open store: {e}"))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<DatabaseConfig, String> {
    let config = match path {
        Some(path) => {
            let mut config = DatabaseConfig::load(path)
                .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?;
            config
                .apply_env()
                .map_err(|e| format!("Failed to apply environment: {e}"))?;
            config
        }
        None => DatabaseConfig::from_env()
            .map_err(|e| format!("Failed to read settings from environment: {e}"))?,
    };
    config
        .validate()
        .map_err(|e| format!("Invalid settings: {e}"))?;
    debug!(?config, "settings resolved");
    Ok(config)
}

fn run_init(ctx: &Context) -> Result<(), String> {
    let store = ctx.store()?;
    store
        .ensure_schema()
        .map_err(|e| format!("Init failed: {e}"))?;
    println!(
        "Media table '{}' ready in {} database '{}'.",
        ctx.config.table, ctx.config.engine, ctx.config.name
    );
    Ok(())
}

fn run_status(ctx: &Context) -> Result<(), String> {
    let status: StoreStatus = ctx
        .store()?
        .status()
        .map_err(|e| format!("Failed to get status: {e}"))?;
    if ctx.format != CliOutputFormat::Text {
        return emit(ctx.format, &status);
    }
    println!("Store Status:");
    println!("  Engine: {}", ctx.config.engine);
    println!("  Table: {}", ctx.config.table);
    println!(
        "  Table exists: {}",
        if status.table_exists { "yes" } else { "no" }
    );
    println!("  Record count: {}", status.record_count);
    Ok(())
}

fn run_add(ctx: &Context, args: AddArgs) -> Result<(), String> {
    let kind: ContentKind = args.kind.parse().map_err(|e| format!("{e}"))?;
    let record = MediaRecord::new(args.name, args.file_ref, args.unique_id, kind);
    let outcome = ctx
        .store()?
        .save(&record)
        .map_err(|e| format!("Failed to store record: {e}"))?;
    match outcome {
        SaveOutcome::Stored => println!("Stored '{}' ({}).", record.media_name, record.unique_id),
        SaveOutcome::AlreadyKnown => println!("Already known: {}", record.unique_id),
    }
    Ok(())
}

fn run_get(ctx: &Context, args: GetArgs) -> Result<(), String> {
    let record = ctx
        .store()?
        .find(&args.unique_id)
        .map_err(|e| format!("Lookup failed: {e}"))?;
    if ctx.format != CliOutputFormat::Text {
        return emit(ctx.format, &record);
    }
    println!("{}", record.media_name);
    println!("  unique_id: {}", record.unique_id);
    println!("  file_reference: {}", record.file_reference);
    println!("  content_kind: {}", record.content_kind);
    Ok(())
}

fn run_list(ctx: &Context, args: ListArgs) -> Result<(), String> {
    let order_by: Vec<&str> = args.order_by.iter().map(String::as_str).collect();
    let rows = ctx
        .store()?
        .table()
        .fetch_all(&order_by, args.desc)
        .map_err(|e| format!("List failed: {e}"))?;
    if ctx.format != CliOutputFormat::Text {
        return emit(ctx.format, &rows);
    }
    for row in &rows {
        println!("{}", format_row(row));
    }
    println!("{} row(s)", rows.len());
    Ok(())
}

fn run_col(ctx: &Context, args: ColArgs) -> Result<(), String> {
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let order_by: Vec<&str> = args.order_by.iter().map(String::as_str).collect();
    let values = ctx
        .store()?
        .table()
        .fetch_col(&columns, &order_by, args.desc)
        .map_err(|e| format!("Column fetch failed: {e}"))?;
    if ctx.format != CliOutputFormat::Text {
        return emit(ctx.format, &values);
    }
    for value in &values {
        println!("{value}");
    }
    Ok(())
}

fn run_search(ctx: &Context, args: SearchArgs) -> Result<(), String> {
    let query = SearchQuery::from_terms(&args.terms);
    if query.is_empty() {
        return Err("search needs at least one non-empty term".to_string());
    }
    let records = ctx
        .store()?
        .all()
        .map_err(|e| format!("Search failed: {e}"))?;
    let view = SearchIndex::build(&records, &query).page(args.page);
    if ctx.format != CliOutputFormat::Text {
        return emit(ctx.format, &view);
    }
    print_page(&view);
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<(), String> {
    let conditions = parse_assignments(&args.conditions)?;
    let removed = ctx
        .store()?
        .table()
        .delete(&conditions)
        .map_err(|e| format!("Delete failed: {e}"))?;
    println!("Deleted {removed} row(s).");
    Ok(())
}

fn run_update(ctx: &Context, args: UpdateArgs) -> Result<(), String> {
    let changes = parse_assignments(&args.changes)?;
    let conditions = parse_assignments(&args.conditions)?;
    let changed = ctx
        .store()?
        .table()
        .update(&changes, &conditions)
        .map_err(|e| format!("Update failed: {e}"))?;
    println!("Updated {changed} row(s).");
    Ok(())
}

fn run_column(ctx: &Context, args: ColumnArgs) -> Result<(), String> {
    let store = ctx.store()?;
    let table = store.table();
    match args.operation {
        ColumnOperation::Add(a) => {
            let mut field = build_field(&a.field)?;
            if a.unique {
                field = field.unique();
            }
            table
                .add_column(&a.name, field)
                .map_err(|e| format!("Add column failed: {e}"))?;
            println!("Added column '{}' to '{}'.", a.name, table.name());
        }
        ColumnOperation::Drop(a) => {
            table
                .drop_column(&a.name)
                .map_err(|e| format!("Drop column failed: {e}"))?;
            println!("Dropped column '{}' from '{}'.", a.name, table.name());
        }
        ColumnOperation::Rename(a) => {
            table
                .rename_column(&a.old, &a.new)
                .map_err(|e| format!("Rename column failed: {e}"))?;
            println!("Renamed column '{}' to '{}'.", a.old, a.new);
        }
        ColumnOperation::Alter(a) => {
            let field = build_field(&a.field)?;
            table
                .alter_column_type(&a.name, field)
                .map_err(|e| format!("Alter column failed: {e}"))?;
            println!("Changed type of column '{}'.", a.name);
        }
    }
    Ok(())
}

fn build_field(args: &FieldArgs) -> Result<FieldDescriptor, String> {
    let kind: FieldKind = args.kind.parse()?;
    let field = FieldDescriptor::new(kind, args.size).map_err(|e| e.to_string())?;
    Ok(field.nullable(!args.not_null))
}

/// Parses `column=value` pairs. Values that read as numbers are bound as
/// numbers, everything else as text.
fn parse_assignments(raw: &[String]) -> Result<Vec<(String, Value)>, String> {
    raw.iter()
        .map(|pair| {
            let (column, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected column=value, got '{pair}'"))?;
            let column = column.trim();
            if column.is_empty() {
                return Err(format!("missing column name in '{pair}'"));
            }
            Ok((column.to_string(), parse_value(value)))
        })
        .collect()
}

fn parse_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Real(f);
        }
    }
    Value::from(raw)
}

fn format_row(row: &Row) -> String {
    row.fields()
        .iter()
        .map(|(column, value)| format!("{column}={value}"))
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_page(view: &PageView) {
    println!(
        "{} (page {}/{})",
        view.indicator.label(),
        view.page + 1,
        view.page_count
    );
    for entry in &view.entries {
        println!("  {}  [{}]", entry.name, entry.token);
    }
    if let Some(nav) = &view.navigation {
        println!("  [{}] [{}]", nav.back, nav.next);
    }
    println!("  [{}]", view.done);
}

fn emit<T: Serialize + ?Sized>(format: CliOutputFormat, value: &T) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize JSON: {e}"))?,
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize YAML: {e}"))?
        }
        CliOutputFormat::Text => return Err("text output is rendered by each command".to_string()),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments() {
        let parsed = parse_assignments(&[
            "id=3".to_string(),
            "media_name=a=b".to_string(),
            "score=1.5".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed[0], ("id".to_string(), Value::Integer(3)));
        assert_eq!(parsed[1], ("media_name".to_string(), Value::from("a=b")));
        assert_eq!(parsed[2].1, Value::Real(1.5));
    }

    #[test]
    fn test_parse_assignments_rejects_missing_equals() {
        assert!(parse_assignments(&["id".to_string()]).is_err());
        assert!(parse_assignments(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_non_finite_numbers_stay_text() {
        assert_eq!(parse_value("inf"), Value::from("inf"));
        assert_eq!(parse_value("NaN"), Value::from("NaN"));
    }

    #[test]
    fn test_build_field() {
        let args = FieldArgs {
            kind: "varchar".into(),
            size: 32,
            not_null: true,
        };
        let field = build_field(&args).unwrap();
        assert_eq!(field.kind(), FieldKind::VarChar);
        assert!(!field.is_nullable());

        let too_big = FieldArgs {
            kind: "char".into(),
            size: 300,
            not_null: false,
        };
        assert!(build_field(&too_big).is_err());
    }
}
