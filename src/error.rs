//! Error kinds raised by the ingestion pipeline.
//!
//! Schema and coercion errors abort a job before anything is committed.
//! [`IngestError::RowCountMismatch`], [`IngestError::FingerprintMismatch`]
//! and [`IngestError::ContentMismatch`] are only produced by the auditor,
//! after the commit has happened.

use std::io;

use thiserror::Error;

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unknown column type '{0}'. Supported types: string, integer, float, boolean, datetime")]
    UnknownType(String),

    #[error("Duplicate column name '{0}' in declarations")]
    DuplicateColumnName(String),

    #[error("At least one column declaration is required")]
    EmptyDeclarationSet,

    #[error("Declared column '{0}' is not present in the CSV header")]
    MissingColumn(String),

    #[error("Coercion failed on row {row_index} column '{column}': cannot read '{raw_value}' as {expected}")]
    FieldCoercionError {
        row_index: usize,
        column: String,
        raw_value: String,
        expected: &'static str,
    },

    #[error("Row count mismatch: CSV has {expected} row(s), but the table has {actual} record(s)")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Fingerprint mismatch on row {row_index}: {fingerprint} not found in the table")]
    FingerprintMismatch {
        row_index: usize,
        fingerprint: String,
    },

    #[error(
        "Stored content mismatch on row {row_index}: no record holds the values of this row (content digest {digest})"
    )]
    ContentMismatch { row_index: usize, digest: String },

    #[error("Invalid column declarations: {0}")]
    Declarations(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Reading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Destination store: {0}")]
    Store(#[from] rusqlite::Error),
}

impl IngestError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        IngestError::Io {
            context: context.into(),
            source,
        }
    }

    /// Errors that can only surface after the commit.
    pub fn is_audit_failure(&self) -> bool {
        matches!(
            self,
            IngestError::RowCountMismatch { .. }
                | IngestError::FingerprintMismatch { .. }
                | IngestError::ContentMismatch { .. }
        )
    }
}
