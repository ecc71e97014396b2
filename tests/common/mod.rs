#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_ingest::declarations::ColumnDeclaration;
use tempfile::{TempDir, tempdir};

pub const PEOPLE_CSV: &str = "name,age\nAda,36\nLin,29\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn database(&self) -> PathBuf {
        self.temp_dir.path().join("jobs.db")
    }
}

pub fn declarations(pairs: &[(&str, &str)]) -> Vec<ColumnDeclaration> {
    pairs
        .iter()
        .map(|(name, ty)| ColumnDeclaration::new(*name, *ty))
        .collect()
}

/// Row count of `table`, read through a separate connection.
pub fn table_count(database: &Path, table: &str) -> i64 {
    let conn = rusqlite::Connection::open(database).expect("open db");
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

/// Runs arbitrary SQL against `database` behind the pipeline's back.
pub fn tamper(database: &Path, sql: &str) {
    let conn = rusqlite::Connection::open(database).expect("open db");
    conn.execute_batch(sql).expect("tamper");
}
