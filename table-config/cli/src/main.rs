//! table-config - Generates filter, search and sort table definitions from an API schema

use std::path::PathBuf;

use clap::Parser;
use table_config_lib::{ApiSource, ConflictPolicy, FileOutcome, FsReader, ProjectConfig, TableConfigError, generate_and_write};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "table-config")]
#[command(version)]
#[command(about = "Generate react-table-state-psm filter, search and sort definitions", long_about = None)]
struct Cli {
    /// API schema document (JSON)
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Project configuration (TOML) listing output files and their operations
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory output file paths are relative to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Module the generated enums are imported from
    #[arg(long, value_name = "PATH")]
    types_import_path: Option<String>,

    /// How to settle differences with existing files
    /// (prefer-generated, regenerate, prefer-existing)
    #[arg(long, value_name = "POLICY")]
    conflict: Option<ConflictPolicy>,

    /// Print the reconciled files instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Print a JSON summary of the processed files
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,
}

/// Initialize tracing subscriber with verbosity-based filtering.
///
/// `RUST_LOG` takes precedence over the `-v` flags. Logs go to stderr so
/// dry-run output on stdout stays clean.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,table_config_lib=info".to_string(),
            2 => "info,table_config_lib=debug".to_string(),
            _ => "debug,table_config_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

async fn run(cli: &Cli) -> Result<Vec<FileOutcome>, TableConfigError> {
    let text = tokio::fs::read_to_string(&cli.schema)
        .await
        .map_err(|source| TableConfigError::Io {
            path: cli.schema.clone(),
            source,
        })?;
    let api = ApiSource::from_json(&text)?;

    let mut project = match &cli.config {
        Some(path) => ProjectConfig::load(path).await?,
        None => ProjectConfig::default(),
    };
    if let Some(policy) = cli.conflict {
        project.conflict = policy;
    }
    if let Some(path) = &cli.types_import_path {
        project.types_import_path = Some(path.clone());
    }

    tracing::debug!(
        operations = api.operations.len(),
        schemas = api.schemas.len(),
        conflict = %project.conflict,
        "schema loaded"
    );

    generate_and_write(
        &api,
        &project.output_files(),
        &project.table_config(),
        &cli.output_dir,
        &FsReader,
        cli.dry_run,
    )
    .await
}

fn report(cli: &Cli, outcomes: &[FileOutcome]) {
    if cli.json {
        let summary: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|outcome| {
                serde_json::json!({
                    "path": outcome.path.display().to_string(),
                    "declarations": outcome.declarations,
                    "written": outcome.written,
                })
            })
            .collect();
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing summary: {e}"),
        }
        return;
    }

    if outcomes.is_empty() {
        println!("No list operations produced table configuration.");
        return;
    }

    for outcome in outcomes {
        if cli.dry_run {
            println!("// ==> {}", outcome.path.display());
            print!("{}", outcome.content);
        } else {
            println!("Wrote {} ({} declarations)", outcome.path.display(), outcome.declarations);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity);

    match run(&cli).await {
        Ok(outcomes) => report(&cli, &outcomes),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
