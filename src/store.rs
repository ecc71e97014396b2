//! SQLite destination store.
//!
//! One database may hold many job tables. Writes only happen through
//! [`Store::materialize`] and [`Store::commit_records`]; the auditor gets a
//! shared borrow and only reads.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use rusqlite::{Connection, Row, params_from_iter, types::ToSql};

use crate::{
    data::Value,
    error::Result,
    schema::{TableSchema, quote_identifier},
    types::StorageType,
};

/// A record staged for insertion, values aligned with
/// [`TableSchema::declared_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub identity: String,
    pub fingerprint: String,
    pub values: Vec<Option<Value>>,
}

pub struct Store {
    conn: Connection,
    location: Option<PathBuf>,
}

/// `mydatabase_<YYYYMMDDHHMMSSmmm>.db`, relative to the working directory.
pub fn default_database_path() -> PathBuf {
    PathBuf::from(format!(
        "mydatabase_{}.db",
        Local::now().format("%Y%m%d%H%M%S%3f")
    ))
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!("Opened SQLite database {:?}", path);
        Ok(Self {
            conn,
            location: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            location: None,
        })
    }

    /// Database file, or `:memory:`.
    pub fn identifier(&self) -> String {
        self.location
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    pub fn materialize(&self, schema: &TableSchema) -> Result<()> {
        let sql = schema.create_table_sql();
        debug!("{sql}");
        self.conn.execute(&sql, [])?;
        info!(
            "Created table '{}' with {} declared column(s)",
            schema.table_name,
            schema.declared_columns.len()
        );
        Ok(())
    }

    /// Inserts every record inside a single transaction. Nothing is visible
    /// unless all inserts succeed.
    pub fn commit_records(&mut self, schema: &TableSchema, records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema.insert_sql())?;
            for record in records {
                let mut params: Vec<&dyn ToSql> = Vec::with_capacity(record.values.len() + 2);
                params.push(&record.identity);
                params.push(&record.fingerprint);
                params.extend(record.values.iter().map(|value| value as &dyn ToSql));
                stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn record_count(&self, schema: &TableSchema) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            quote_identifier(&schema.table_name)
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn fingerprints(&self, schema: &TableSchema) -> Result<HashSet<String>> {
        let sql = format!(
            "SELECT {} FROM {}",
            quote_identifier(&schema.fingerprint_column),
            quote_identifier(&schema.table_name)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<HashSet<_>>>()
            .map_err(Into::into)
    }

    /// Reads every record back with values typed per the schema.
    pub fn records(&self, schema: &TableSchema) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&schema.select_records_sql())?;
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(schema.declared_columns.len());
            for (idx, column) in schema.declared_columns.iter().enumerate() {
                values.push(read_value(row, idx + 2, column.storage())?);
            }
            Ok(Record {
                identity: row.get(0)?,
                fingerprint: row.get(1)?,
                values,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }
}

fn read_value(row: &Row<'_>, idx: usize, storage: StorageType) -> rusqlite::Result<Option<Value>> {
    Ok(match storage {
        StorageType::Text => row.get::<_, Option<String>>(idx)?.map(Value::String),
        StorageType::Integer => row.get::<_, Option<i64>>(idx)?.map(Value::Integer),
        StorageType::Real => row.get::<_, Option<f64>>(idx)?.map(Value::Float),
        StorageType::Boolean => row.get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        StorageType::Timestamp => row
            .get::<_, Option<NaiveDateTime>>(idx)?
            .map(Value::DateTime),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        declarations::ColumnDeclaration,
        schema::{SchemaOptions, build_with_options},
    };

    fn schema() -> TableSchema {
        let declarations = vec![
            ColumnDeclaration::new("name", "string"),
            ColumnDeclaration::new("age", "integer"),
            ColumnDeclaration::new("score", "float"),
            ColumnDeclaration::new("active", "boolean"),
            ColumnDeclaration::new("seen", "datetime"),
        ];
        let options = SchemaOptions {
            table_name: Some("people".into()),
            ..SchemaOptions::default()
        };
        build_with_options(&declarations, &options).expect("schema")
    }

    fn record(identity: &str, age: Option<i64>) -> Record {
        let seen = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        Record {
            identity: identity.into(),
            fingerprint: format!("fp-{identity}"),
            values: vec![
                Some(Value::String("Ada".into())),
                age.map(Value::Integer),
                Some(Value::Float(2.5)),
                Some(Value::Boolean(true)),
                Some(Value::DateTime(seen)),
            ],
        }
    }

    #[test]
    fn committed_records_read_back_with_their_types() {
        let mut store = Store::open_in_memory().expect("store");
        let schema = schema();
        store.materialize(&schema).expect("create");
        let staged = vec![record("a", Some(36)), record("b", None)];
        assert_eq!(store.commit_records(&schema, &staged).unwrap(), 2);

        assert_eq!(store.record_count(&schema).unwrap(), 2);
        let fingerprints = store.fingerprints(&schema).unwrap();
        assert!(fingerprints.contains("fp-a"));
        assert!(fingerprints.contains("fp-b"));

        let mut read = store.records(&schema).unwrap();
        read.sort_by(|l, r| l.identity.cmp(&r.identity));
        assert_eq!(read, staged);
    }

    #[test]
    fn failed_commit_leaves_table_empty() {
        let mut store = Store::open_in_memory().expect("store");
        let schema = schema();
        store.materialize(&schema).expect("create");
        // Duplicate primary key makes the second insert fail.
        let staged = vec![record("a", Some(1)), record("a", Some(2))];
        assert!(store.commit_records(&schema, &staged).is_err());
        assert_eq!(store.record_count(&schema).unwrap(), 0);
    }

    #[test]
    fn materialize_refuses_an_existing_table() {
        let store = Store::open_in_memory().expect("store");
        let schema = schema();
        store.materialize(&schema).expect("create");
        assert!(store.materialize(&schema).is_err());
        assert_eq!(store.identifier(), ":memory:");
    }

    #[test]
    fn default_database_name_has_millisecond_stamp() {
        let path = default_database_path();
        let name = path.to_str().unwrap();
        assert!(name.starts_with("mydatabase_"));
        assert!(name.ends_with(".db"));
        assert_eq!(name.len(), "mydatabase_".len() + 17 + ".db".len());
    }
}
