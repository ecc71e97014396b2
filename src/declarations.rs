//! Column declarations: the `name → type` mapping a job starts from.
//!
//! Declarations come either from repeated `-c name:type` arguments or from a
//! YAML/JSON file (`.json` is read as JSON, anything else as YAML). Type
//! names are kept as written here; the schema builder resolves them.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{IngestError, Result},
    types::LogicalType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub logical_type: String,
}

impl ColumnDeclaration {
    pub fn new(name: impl Into<String>, logical_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: logical_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationFile {
    pub columns: Vec<ColumnDeclaration>,
}

impl DeclarationFile {
    /// Every header typed as `string`.
    pub fn from_headers(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .map(|header| ColumnDeclaration::new(header.clone(), LogicalType::String.as_str()))
            .collect();
        Self { columns }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|err| IngestError::io(format!("Opening declarations file {path:?}"), err))?;
        let reader = BufReader::new(file);
        if is_json(path) {
            serde_json::from_reader(reader)
                .map_err(|err| IngestError::Declarations(format!("{path:?}: {err}")))
        } else {
            serde_yaml::from_reader(reader)
                .map_err(|err| IngestError::Declarations(format!("{path:?}: {err}")))
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|err| IngestError::Declarations(err.to_string()))
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let rendered = self.to_yaml_string()?;
        writer
            .write_all(rendered.as_bytes())
            .map_err(|err| IngestError::io("Writing declarations", err))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|err| IngestError::io(format!("Creating declarations file {path:?}"), err))?;
        if is_json(path) {
            serde_json::to_writer_pretty(file, self)
                .map_err(|err| IngestError::Declarations(err.to_string()))
        } else {
            self.write_to(file)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parses `name:type` tokens. Each argument may hold several comma-separated
/// tokens and arguments may repeat.
pub fn parse_column_specs(specs: &[String]) -> Result<Vec<ColumnDeclaration>> {
    let mut columns = Vec::new();
    let mut seen = HashSet::new();

    for raw in specs {
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            // Header names may contain ':'; the type never does.
            let (name_part, type_part) = token.rsplit_once(':').ok_or_else(|| {
                IngestError::Declarations(format!(
                    "Column definition '{token}' must use the form name:type"
                ))
            })?;
            let name = name_part.trim();
            if name.is_empty() {
                return Err(IngestError::Declarations(format!(
                    "Column name cannot be empty in definition '{token}'"
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(IngestError::DuplicateColumnName(name.to_string()));
            }
            columns.push(ColumnDeclaration::new(name, type_part.trim()));
        }
    }

    Ok(columns)
}
