//! Lazy source-row reading.
//!
//! [`RowSource`] wraps a CSV reader and yields one [`SourceRow`] per data
//! line. It cannot be rewound: the auditor opens a fresh one over the same
//! path when it needs a second pass.

use std::{fs::File, io::BufReader, path::Path, rc::Rc};

use csv::ByteRecord;
use encoding_rs::Encoding;

use crate::{error::Result, io_utils};

/// One data row, keyed by header name in file order.
#[derive(Debug, Clone)]
pub struct SourceRow {
    index: usize,
    headers: Rc<[String]>,
    values: Vec<String>,
}

impl SourceRow {
    pub fn new(index: usize, headers: Rc<[String]>, values: Vec<String>) -> Self {
        Self {
            index,
            headers,
            values,
        }
    }

    /// 1-based position among the data rows (the header is not counted).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value under `column`. When the header repeats a name, the last
    /// occurrence wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .rposition(|header| header == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

pub struct RowSource {
    reader: csv::Reader<BufReader<File>>,
    headers: Rc<[String]>,
    encoding: &'static Encoding,
    record: ByteRecord,
    next_index: usize,
}

impl RowSource {
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)?;
        Ok(Self {
            reader,
            headers: Rc::from(headers),
            encoding,
            record: ByteRecord::new(),
            next_index: 1,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn read_next(&mut self) -> Result<Option<SourceRow>> {
        if !self.reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }
        let values = io_utils::decode_record(&self.record, self.encoding)?;
        let row = SourceRow::new(self.next_index, Rc::clone(&self.headers), values);
        self.next_index += 1;
        Ok(Some(row))
    }
}

impl Iterator for RowSource {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Number of data rows in `path`, header excluded.
pub fn count_rows(path: &Path, delimiter: u8) -> Result<usize> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let mut record = ByteRecord::new();
    let mut count = 0usize;
    while reader.read_byte_record(&mut record)? {
        count += 1;
    }
    Ok(count)
}
