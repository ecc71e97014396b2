//! Table schema construction.
//!
//! A [`TableSchema`] is plain data: the job's declared columns resolved
//! through the type registry, plus the synthetic identity and fingerprint
//! columns every job table carries. The store turns it into SQL.

use std::collections::HashSet;

use chrono::Local;

use crate::{
    declarations::ColumnDeclaration,
    error::{IngestError, Result},
    types::{LogicalType, StorageType},
};

pub const DEFAULT_IDENTITY_COLUMN: &str = "record_id";
pub const DEFAULT_FINGERPRINT_COLUMN: &str = "checksum";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub logical_type: LogicalType,
}

impl ColumnDef {
    pub fn storage(&self) -> StorageType {
        self.logical_type.storage()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub identity_column: String,
    pub fingerprint_column: String,
    pub declared_columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&str> {
        self.declared_columns
            .iter()
            .map(|column| column.name.as_str())
            .collect()
    }

    /// Declared column names in fingerprint order.
    pub fn canonical_columns(&self) -> Vec<&str> {
        let mut names = self.column_names();
        names.sort_unstable();
        names
    }

    pub fn create_table_sql(&self) -> String {
        let mut columns = vec![
            format!(
                "{} TEXT PRIMARY KEY NOT NULL",
                quote_identifier(&self.identity_column)
            ),
            format!(
                "{} TEXT NOT NULL",
                quote_identifier(&self.fingerprint_column)
            ),
        ];
        columns.extend(self.declared_columns.iter().map(|column| {
            format!(
                "{} {}",
                quote_identifier(&column.name),
                column.storage().sql_type()
            )
        }));
        format!(
            "CREATE TABLE {} ({})",
            quote_identifier(&self.table_name),
            columns.join(", ")
        )
    }

    pub fn insert_sql(&self) -> String {
        let names = self.all_columns_quoted();
        let placeholders = (1..=names.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.table_name),
            names.join(", "),
            placeholders.join(", ")
        )
    }

    pub fn select_records_sql(&self) -> String {
        format!(
            "SELECT {} FROM {}",
            self.all_columns_quoted().join(", "),
            quote_identifier(&self.table_name)
        )
    }

    fn all_columns_quoted(&self) -> Vec<String> {
        let mut names = vec![
            quote_identifier(&self.identity_column),
            quote_identifier(&self.fingerprint_column),
        ];
        names.extend(
            self.declared_columns
                .iter()
                .map(|column| quote_identifier(&column.name)),
        );
        names
    }
}

/// Options the schema builder applies on top of the declarations.
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    pub table_name: Option<String>,
    pub identity_column: String,
    pub fingerprint_column: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            table_name: None,
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
            fingerprint_column: DEFAULT_FINGERPRINT_COLUMN.to_string(),
        }
    }
}

/// `data_<timestamp>` with microsecond resolution so successive jobs get
/// distinct tables.
pub fn default_table_name() -> String {
    format!("data_{}", Local::now().format("%Y%m%d%H%M%S%6f"))
}

pub fn build(declarations: &[ColumnDeclaration]) -> Result<TableSchema> {
    build_with_options(declarations, &SchemaOptions::default())
}

pub fn build_with_options(
    declarations: &[ColumnDeclaration],
    options: &SchemaOptions,
) -> Result<TableSchema> {
    if declarations.is_empty() {
        return Err(IngestError::EmptyDeclarationSet);
    }
    if options.identity_column == options.fingerprint_column {
        return Err(IngestError::DuplicateColumnName(
            options.fingerprint_column.clone(),
        ));
    }

    let mut seen = HashSet::from([
        options.identity_column.as_str(),
        options.fingerprint_column.as_str(),
    ]);
    let mut declared_columns = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        if !seen.insert(declaration.name.as_str()) {
            return Err(IngestError::DuplicateColumnName(declaration.name.clone()));
        }
        let logical_type = declaration.logical_type.parse::<LogicalType>()?;
        declared_columns.push(ColumnDef {
            name: declaration.name.clone(),
            logical_type,
        });
    }

    Ok(TableSchema {
        table_name: options
            .table_name
            .clone()
            .unwrap_or_else(default_table_name),
        identity_column: options.identity_column.clone(),
        fingerprint_column: options.fingerprint_column.clone(),
        declared_columns,
    })
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
