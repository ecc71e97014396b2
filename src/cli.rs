use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::schema::{DEFAULT_FINGERPRINT_COLUMN, DEFAULT_IDENTITY_COLUMN};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load CSV files into SQLite and verify them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a CSV file into a new table using declared column types, then audit it
    Ingest(IngestArgs),
    /// Re-audit a table produced by an earlier ingest against its source CSV
    Audit(AuditArgs),
    /// Write a declarations template (every column typed string) from a CSV header
    Declare(DeclareArgs),
}

#[derive(Debug, Args)]
pub struct DeclarationArgs {
    /// Column declarations of the form `name:type` (comma separated or repeated)
    #[arg(short = 'c', long = "column", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// YAML or JSON file listing column declarations
    #[arg(short = 'd', long = "declarations", conflicts_with = "columns")]
    pub declarations: Option<PathBuf>,
    /// Name of the synthetic primary key column
    #[arg(long = "identity-column", default_value = DEFAULT_IDENTITY_COLUMN)]
    pub identity_column: String,
    /// Name of the column holding row fingerprints
    #[arg(long = "fingerprint-column", default_value = DEFAULT_FINGERPRINT_COLUMN)]
    pub fingerprint_column: String,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub declarations: DeclarationArgs,
    /// SQLite database file (defaults to mydatabase_<timestamp>.db)
    #[arg(long = "database")]
    pub database: Option<PathBuf>,
    /// Table name (defaults to data_<timestamp>)
    #[arg(long = "table")]
    pub table: Option<String>,
    /// Commit without running the integrity audit
    #[arg(long = "skip-audit")]
    pub skip_audit: bool,
    /// Print the job summary as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub declarations: DeclarationArgs,
    /// SQLite database file holding the table
    #[arg(long = "database")]
    pub database: PathBuf,
    /// Table to audit
    #[arg(long = "table")]
    pub table: String,
}

#[derive(Debug, Args)]
pub struct DeclareArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Destination file (.json for JSON, YAML otherwise); stdout if omitted
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
