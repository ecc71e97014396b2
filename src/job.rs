//! One ingestion job from start to finish.
//!
//! `run_job` is the entry point the command line calls. Schema and ingestion
//! failures come back as `Err` and leave nothing committed. Audit failures
//! happen after the commit; they are carried inside [`JobOutcome`] instead.

use std::path::PathBuf;

use log::{error, info};
use serde::Serialize;

use crate::{
    audit::{self, AuditReport, SourceFormat},
    declarations::ColumnDeclaration,
    error::Result,
    ingest::{self, check_headers},
    io_utils,
    rows::RowSource,
    schema::{self, SchemaOptions, TableSchema},
    store::{self, Store},
};

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input: PathBuf,
    pub declarations: Vec<ColumnDeclaration>,
    /// Database file; a timestamped name in the working directory if unset.
    pub database: Option<PathBuf>,
    pub schema: SchemaOptions,
    pub delimiter: Option<u8>,
    pub input_encoding: Option<String>,
    pub skip_audit: bool,
}

impl JobConfig {
    pub fn new(input: impl Into<PathBuf>, declarations: Vec<ColumnDeclaration>) -> Self {
        Self {
            input: input.into(),
            declarations,
            database: None,
            schema: SchemaOptions::default(),
            delimiter: None,
            input_encoding: None,
            skip_audit: false,
        }
    }

    pub fn source_format(&self) -> Result<SourceFormat> {
        Ok(SourceFormat {
            delimiter: io_utils::resolve_input_delimiter(&self.input, self.delimiter),
            encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
        })
    }
}

#[derive(Debug)]
pub struct JobOutcome {
    pub database: String,
    pub table: String,
    pub ingested: usize,
    /// `None` when the audit was skipped.
    pub audit: Option<Result<AuditReport>>,
}

impl JobOutcome {
    pub fn verified(&self) -> bool {
        matches!(self.audit, Some(Ok(_)))
    }

    pub fn summary(&self) -> JobSummary {
        let (verified_rows, audit_error) = match &self.audit {
            Some(Ok(report)) => (Some(report.verified_rows), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, None),
        };
        JobSummary {
            database: self.database.clone(),
            table: self.table.clone(),
            ingested: self.ingested,
            audited: self.audit.is_some(),
            verified_rows,
            audit_error,
        }
    }
}

/// Serializable view of a [`JobOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub database: String,
    pub table: String,
    pub ingested: usize,
    pub audited: bool,
    pub verified_rows: Option<usize>,
    pub audit_error: Option<String>,
}

pub fn run_job(config: &JobConfig) -> Result<JobOutcome> {
    let database = config
        .database
        .clone()
        .unwrap_or_else(store::default_database_path);
    let mut store = Store::open(&database)?;
    run_job_with_store(config, &mut store)
}

/// Same as [`run_job`] against a store the caller already opened.
pub fn run_job_with_store(config: &JobConfig, store: &mut Store) -> Result<JobOutcome> {
    let format = config.source_format()?;
    let table_schema = schema::build_with_options(&config.declarations, &config.schema)?;

    let rows = RowSource::open(&config.input, format.delimiter, format.encoding)?;
    check_headers(&table_schema, rows.headers())?;

    store.materialize(&table_schema)?;
    info!(
        "Ingesting {:?} into {} table '{}'",
        config.input,
        store.identifier(),
        table_schema.table_name
    );
    let report = ingest::ingest(store, &table_schema, rows)?;
    info!("Committed {} record(s)", report.rows);

    let audit = if config.skip_audit {
        None
    } else {
        Some(run_audit(store, &table_schema, config, format))
    };

    Ok(JobOutcome {
        database: store.identifier(),
        table: table_schema.table_name,
        ingested: report.rows,
        audit,
    })
}

fn run_audit(
    store: &Store,
    table_schema: &TableSchema,
    config: &JobConfig,
    format: SourceFormat,
) -> Result<AuditReport> {
    let result = audit::audit(
        store,
        table_schema,
        &config.input,
        &config.declarations,
        format,
    );
    match &result {
        Err(err) if err.is_audit_failure() => {
            error!("Integrity audit failed, committed data was kept: {err}")
        }
        Err(err) => error!("Integrity audit could not complete: {err}"),
        Ok(_) => {}
    }
    result
}

/// Audits a table committed by an earlier job. The schema is rebuilt from
/// the same declarations, so they must match the ones used for ingestion.
pub fn audit_existing(
    store: &Store,
    config: &JobConfig,
    table_name: &str,
) -> Result<AuditReport> {
    let options = SchemaOptions {
        table_name: Some(table_name.to_string()),
        ..config.schema.clone()
    };
    let table_schema = schema::build_with_options(&config.declarations, &options)?;
    let format = config.source_format()?;
    audit::audit(
        store,
        &table_schema,
        &config.input,
        &config.declarations,
        format,
    )
}
