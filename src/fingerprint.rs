//! Row fingerprints.
//!
//! A fingerprint is the hex SHA-256 of a row's declared fields, taken in
//! column-name order and joined with [`FINGERPRINT_DELIMITER`]. Sorting by
//! name makes the digest independent of the physical column order in the
//! file, so two rows with the same content always collide.

use sha2::{Digest, Sha256};

use crate::rows::SourceRow;

pub const FINGERPRINT_DELIMITER: &str = ",";

/// Hashes already-ordered field values.
pub fn digest_fields<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            hasher.update(FINGERPRINT_DELIMITER.as_bytes());
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprints the raw values of `columns` in `row`. Columns missing from
/// the row count as empty strings.
pub fn fingerprint<S: AsRef<str>>(row: &SourceRow, columns: &[S]) -> String {
    let mut sorted = columns.iter().map(AsRef::as_ref).collect::<Vec<&str>>();
    sorted.sort_unstable();
    digest_fields(sorted.into_iter().map(|name| row.get(name).unwrap_or("")))
}
