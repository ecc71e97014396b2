use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::{
    error::{IngestError, Result},
    types::LogicalType,
};

/// The only accepted layout for `datetime` columns, e.g. `14:30:00 05/06/2024`.
pub const DATETIME_FORMAT: &str = "%H:%M:%S %m/%d/%Y";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Renders the value the same way regardless of whether it came from the
    /// CSV or was read back from the table.
    pub fn as_canonical(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            // SQLite folds -0.0 into 0.
            Value::Float(f) if *f == 0.0 => "0".to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_canonical())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::String(s) => s.to_sql(),
            Value::Integer(i) => i.to_sql(),
            Value::Float(f) => f.to_sql(),
            Value::Boolean(b) => b.to_sql(),
            Value::DateTime(dt) => dt.to_sql(),
        }
    }
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).ok()
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Coerces one raw CSV field. Only `string` columns accept an empty value;
/// every other type parses it like any other input and rejects it.
pub fn coerce_value(value: &str, ty: LogicalType) -> Option<Value> {
    Some(match ty {
        LogicalType::String => Value::String(value.to_string()),
        LogicalType::Integer => Value::Integer(value.parse().ok()?),
        // SQLite stores NaN as NULL, so it could never be read back.
        LogicalType::Float => Value::Float(value.parse::<f64>().ok().filter(|f| !f.is_nan())?),
        LogicalType::Boolean => Value::Boolean(parse_boolean(value)?),
        LogicalType::DateTime => Value::DateTime(parse_naive_datetime(value)?),
    })
}

/// [`coerce_value`] with the failure turned into a `FieldCoercionError`.
pub fn coerce_field(
    row_index: usize,
    column: &str,
    value: &str,
    ty: LogicalType,
) -> Result<Value> {
    coerce_value(value, ty).ok_or_else(|| IngestError::FieldCoercionError {
        row_index,
        column: column.to_string(),
        raw_value: value.to_string(),
        expected: ty.as_str(),
    })
}
