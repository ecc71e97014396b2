//! Post-commit integrity audit.
//!
//! The auditor never writes. It replays the source file against a committed
//! table in three passes, stopping at the first failure:
//!
//! 1. the number of data rows in the file equals the number of records;
//! 2. every row's raw-string fingerprint is among the stored fingerprints
//!    (set membership, so row order does not matter);
//! 3. every row, coerced and rendered canonically, matches the content read
//!    back from the table's typed columns. Stored fingerprints are computed
//!    from raw strings and cannot notice a value edited in place; this pass
//!    can, and reports it as [`IngestError::ContentMismatch`].

use std::{collections::HashMap, path::Path};

use encoding_rs::Encoding;
use log::{debug, info};
use serde::Serialize;

use crate::{
    data::{Value, coerce_field},
    declarations::ColumnDeclaration,
    error::{IngestError, Result},
    fingerprint::{digest_fields, fingerprint},
    ingest::check_headers,
    rows::{RowSource, count_rows},
    schema::TableSchema,
    store::Store,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub table: String,
    pub verified_rows: usize,
}

/// Where and how to re-read the source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceFormat {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

/// Digest of typed values rendered canonically, in fingerprint column order.
///
/// Each present value is length-prefixed (`3:Ada`) and `NULL` renders as a
/// bare `-`, so a `NULL` never collides with empty text and a delimiter
/// inside a value cannot shift it into the next field.
pub fn content_digest(values: &[(&str, Option<&Value>)]) -> String {
    let mut ordered = values.to_vec();
    ordered.sort_unstable_by(|left, right| left.0.cmp(right.0));
    let rendered = ordered
        .iter()
        .map(|(_, value)| match value {
            Some(value) => {
                let text = value.as_canonical();
                format!("{}:{text}", text.len())
            }
            None => NULL_MARKER.to_string(),
        })
        .collect::<Vec<_>>();
    digest_fields(rendered.iter().map(String::as_str))
}

const NULL_MARKER: &str = "-";

pub fn audit(
    store: &Store,
    schema: &TableSchema,
    source: &Path,
    declarations: &[ColumnDeclaration],
    format: SourceFormat,
) -> Result<AuditReport> {
    let expected = count_rows(source, format.delimiter)?;
    let actual = store.record_count(schema)?;
    if expected != actual {
        return Err(IngestError::RowCountMismatch { expected, actual });
    }
    debug!("Row counts match ({expected})");

    let declared = declarations
        .iter()
        .map(|declaration| declaration.name.as_str())
        .collect::<Vec<_>>();
    verify_fingerprints(store, schema, source, &declared, format)?;
    verify_stored_content(store, schema, source, format)?;

    info!(
        "Verified {} record(s) in '{}' against {:?}",
        actual, schema.table_name, source
    );
    Ok(AuditReport {
        table: schema.table_name.clone(),
        verified_rows: actual,
    })
}

fn verify_fingerprints(
    store: &Store,
    schema: &TableSchema,
    source: &Path,
    declared: &[&str],
    format: SourceFormat,
) -> Result<()> {
    let stored = store.fingerprints(schema)?;
    for row in RowSource::open(source, format.delimiter, format.encoding)? {
        let row = row?;
        let computed = fingerprint(&row, declared);
        if !stored.contains(&computed) {
            return Err(IngestError::FingerprintMismatch {
                row_index: row.index(),
                fingerprint: computed,
            });
        }
    }
    Ok(())
}

fn verify_stored_content(
    store: &Store,
    schema: &TableSchema,
    source: &Path,
    format: SourceFormat,
) -> Result<()> {
    let names = schema.column_names();
    let mut remaining: HashMap<String, usize> = HashMap::new();
    for record in store.records(schema)? {
        let pairs = names
            .iter()
            .copied()
            .zip(record.values.iter().map(Option::as_ref))
            .collect::<Vec<_>>();
        *remaining.entry(content_digest(&pairs)).or_insert(0) += 1;
    }

    let rows = RowSource::open(source, format.delimiter, format.encoding)?;
    check_headers(schema, rows.headers())?;
    for row in rows {
        let row = row?;
        let values = schema
            .declared_columns
            .iter()
            .map(|column| {
                let raw = row.get(&column.name).unwrap_or("");
                coerce_field(row.index(), &column.name, raw, column.logical_type)
            })
            .collect::<Result<Vec<_>>>()?;
        let pairs = names
            .iter()
            .copied()
            .zip(values.iter().map(Some))
            .collect::<Vec<_>>();
        let digest = content_digest(&pairs);
        match remaining.get_mut(&digest) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                return Err(IngestError::ContentMismatch {
                    row_index: row.index(),
                    digest,
                });
            }
        }
    }
    Ok(())
}
