use crate::error::{BatchError, BatchResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

/// One undecoded input row with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(line: usize, fields: &[&str]) -> Self {
        Self {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Supplies the ordered rows of one batch.
pub trait RecordSource {
    fn describe(&self) -> String;
    fn read_rows(&mut self) -> BatchResult<Vec<RawRow>>;
}

/// Reads comma-delimited rows from a file. The file is opened and closed
/// within a single `read_rows` call.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_rows(&mut self) -> BatchResult<Vec<RawRow>> {
        let file = File::open(&self.path).map_err(|source| BatchError::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        decode_rows(file)
    }
}

/// In-memory rows, one record per line.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    text: String,
}

impl MemorySource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_lines(lines: &[&str]) -> Self {
        Self::new(lines.join("\n"))
    }
}

impl RecordSource for MemorySource {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn read_rows(&mut self) -> BatchResult<Vec<RawRow>> {
        decode_rows(self.text.as_bytes())
    }
}

/// Splits headerless comma-delimited text into rows. Line numbers are
/// physical and 1-based, counting the blank lines that are skipped. Field
/// bytes are decoded lossily; width is left for the validator to check.
pub fn decode_rows<R: Read>(reader: R) -> BatchResult<Vec<RawRow>> {
    let builder = {
        let mut b = csv::ReaderBuilder::new();
        b.has_headers(false).flexible(true).trim(csv::Trim::None);
        b
    };

    let mut rows = Vec::new();
    for (i, raw) in BufReader::new(reader).split(b'\n').enumerate() {
        let line = i + 1;
        let mut raw = raw.map_err(|e| BatchError::SourceRead(format!("line {line}: {e}")))?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        if raw.is_empty() {
            continue;
        }

        let mut rec = csv::ByteRecord::new();
        builder
            .from_reader(raw.as_slice())
            .read_byte_record(&mut rec)
            .map_err(|e| BatchError::MalformedRecord {
                line,
                reason: e.to_string(),
            })?;
        rows.push(RawRow {
            line,
            fields: rec
                .iter()
                .map(|f| String::from_utf8_lossy(f).into_owned())
                .collect(),
        });
    }
    Ok(rows)
}
