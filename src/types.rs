//! Logical column types and the storage each one maps to.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Text,
    Integer,
    Real,
    Boolean,
    Timestamp,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Integer => "integer",
            LogicalType::Float => "float",
            LogicalType::Boolean => "boolean",
            LogicalType::DateTime => "datetime",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["string", "integer", "float", "boolean", "datetime"]
    }

    pub fn storage(&self) -> StorageType {
        match self {
            LogicalType::String => StorageType::Text,
            LogicalType::Integer => StorageType::Integer,
            LogicalType::Float => StorageType::Real,
            LogicalType::Boolean => StorageType::Boolean,
            LogicalType::DateTime => StorageType::Timestamp,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "string" => Ok(LogicalType::String),
            "integer" => Ok(LogicalType::Integer),
            "float" => Ok(LogicalType::Float),
            "boolean" => Ok(LogicalType::Boolean),
            "datetime" => Ok(LogicalType::DateTime),
            _ => Err(IngestError::UnknownType(value.to_string())),
        }
    }
}

impl StorageType {
    /// Column type used in `CREATE TABLE`.
    pub fn sql_type(&self) -> &'static str {
        match self {
            StorageType::Text => "TEXT",
            StorageType::Integer => "INTEGER",
            StorageType::Real => "REAL",
            StorageType::Boolean => "BOOLEAN",
            StorageType::Timestamp => "DATETIME",
        }
    }
}

/// Resolves a logical type name to its storage type.
pub fn resolve(logical_type: &str) -> Result<StorageType> {
    LogicalType::from_str(logical_type).map(|ty| ty.storage())
}
