pub mod audit;
pub mod cli;
pub mod data;
pub mod declarations;
pub mod error;
pub mod fingerprint;
pub mod ingest;
pub mod io_utils;
pub mod job;
pub mod rows;
pub mod schema;
pub mod store;
pub mod types;

use std::{env, io, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, DeclarationArgs},
    declarations::{ColumnDeclaration, DeclarationFile},
    job::JobConfig,
    rows::RowSource,
    schema::SchemaOptions,
    store::Store,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => handle_ingest(&args),
        Commands::Audit(args) => handle_audit(&args),
        Commands::Declare(args) => handle_declare(&args),
    }
}

fn load_declarations(args: &DeclarationArgs) -> Result<Vec<ColumnDeclaration>> {
    let declarations = match &args.declarations {
        Some(path) => {
            DeclarationFile::load(path)
                .with_context(|| format!("Loading declarations from {path:?}"))?
                .columns
        }
        None => declarations::parse_column_specs(&args.columns)
            .context("Parsing --column declarations")?,
    };
    debug!("Column declarations: {:?}", declarations);
    Ok(declarations)
}

fn job_config(
    source: &cli::SourceArgs,
    declaration_args: &DeclarationArgs,
    table: Option<String>,
) -> Result<JobConfig> {
    let mut config = JobConfig::new(source.input.clone(), load_declarations(declaration_args)?);
    config.delimiter = source.delimiter;
    config.input_encoding = source.input_encoding.clone();
    config.schema = SchemaOptions {
        table_name: table,
        identity_column: declaration_args.identity_column.clone(),
        fingerprint_column: declaration_args.fingerprint_column.clone(),
    };
    Ok(config)
}

fn handle_ingest(args: &cli::IngestArgs) -> Result<()> {
    let mut config = job_config(&args.source, &args.declarations, args.table.clone())?;
    config.database = args.database.clone();
    config.skip_audit = args.skip_audit;
    info!(
        "Ingesting '{}' with {} declared column(s) using delimiter '{}'",
        config.input.display(),
        config.declarations.len(),
        printable_delimiter(config.source_format()?.delimiter)
    );

    let outcome = job::run_job(&config)
        .with_context(|| format!("Ingesting {:?}", config.input))?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&outcome.summary())
            .context("Serializing job summary")?;
        println!("{rendered}");
    }

    match &outcome.audit {
        Some(Ok(report)) => {
            info!(
                "✓ {} row(s) ingested and verified in table '{}' of {}",
                report.verified_rows, outcome.table, outcome.database
            );
            Ok(())
        }
        Some(Err(err)) => Err(anyhow!(
            "Integrity check failed for table '{}' in {}: {err}",
            outcome.table,
            outcome.database
        )),
        None => {
            info!(
                "{} row(s) ingested into table '{}' of {} (audit skipped)",
                outcome.ingested, outcome.table, outcome.database
            );
            Ok(())
        }
    }
}

fn handle_audit(args: &cli::AuditArgs) -> Result<()> {
    let config = job_config(&args.source, &args.declarations, Some(args.table.clone()))?;
    if !args.database.exists() {
        return Err(anyhow!("Database {:?} does not exist", args.database));
    }
    let store = Store::open(&args.database)
        .with_context(|| format!("Opening database {:?}", args.database))?;
    let report = job::audit_existing(&store, &config, &args.table).with_context(|| {
        format!(
            "Auditing table '{}' in {:?} against {:?}",
            args.table, args.database, config.input
        )
    })?;
    info!(
        "✓ {} record(s) in '{}' match {:?}",
        report.verified_rows, report.table, config.input
    );
    Ok(())
}

fn handle_declare(args: &cli::DeclareArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.source.input, args.source.delimiter);
    let encoding = io_utils::resolve_encoding(args.source.input_encoding.as_deref())?;
    let source = RowSource::open(&args.source.input, delimiter, encoding)
        .with_context(|| format!("Reading header of {:?}", args.source.input))?;
    let template = DeclarationFile::from_headers(source.headers());
    match &args.output {
        Some(path) => {
            template
                .save(path)
                .with_context(|| format!("Writing declarations to {path:?}"))?;
            info!(
                "Declarations for {} column(s) written to {:?}",
                template.columns.len(),
                path
            );
        }
        None => template.write_to(io::stdout().lock())?,
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
