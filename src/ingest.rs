//! Ingestion engine: coerce, identify, fingerprint, stage, commit once.

use log::{debug, info, trace};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    data::coerce_field,
    error::{IngestError, Result},
    fingerprint::fingerprint,
    rows::SourceRow,
    schema::TableSchema,
    store::{Record, Store},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub table: String,
    pub rows: usize,
}

/// Fails with `MissingColumn` for the first declared column absent from
/// `headers`.
pub fn check_headers(schema: &TableSchema, headers: &[String]) -> Result<()> {
    for column in &schema.declared_columns {
        if !headers.iter().any(|header| header == &column.name) {
            return Err(IngestError::MissingColumn(column.name.clone()));
        }
    }
    Ok(())
}

/// Builds the record for one source row without touching the store.
pub fn stage_row(schema: &TableSchema, canonical: &[&str], row: &SourceRow) -> Result<Record> {
    let values = schema
        .declared_columns
        .iter()
        .map(|column| {
            let raw = row.get(&column.name).unwrap_or("");
            coerce_field(row.index(), &column.name, raw, column.logical_type).map(Some)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Record {
        identity: Uuid::new_v4().to_string(),
        fingerprint: fingerprint(row, canonical),
        values,
    })
}

/// Streams `rows` into `schema`'s table. The table must already exist.
///
/// Records are only staged while reading; they are written in one
/// transaction after the last row, so any failure leaves the table empty.
pub fn ingest<I>(store: &mut Store, schema: &TableSchema, rows: I) -> Result<IngestionReport>
where
    I: IntoIterator<Item = Result<SourceRow>>,
{
    let canonical = schema.canonical_columns();
    let mut staged = Vec::new();
    for row in rows {
        let row = row?;
        trace!("Row {}: {:?}", row.index(), row.fields().collect::<Vec<_>>());
        let record = stage_row(schema, &canonical, &row)?;
        debug!(
            "Staged row {} as {} (fingerprint {})",
            row.index(),
            record.identity,
            record.fingerprint
        );
        staged.push(record);
    }

    info!(
        "Committing {} record(s) into '{}'",
        staged.len(),
        schema.table_name
    );
    let committed = store.commit_records(schema, &staged)?;
    Ok(IngestionReport {
        table: schema.table_name.clone(),
        rows: committed,
    })
}
