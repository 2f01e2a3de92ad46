//! Record validation: raw rows in, typed and ordered [`LogRecord`]s out.

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::{BatchError, BatchResult};
use crate::source::RawRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Time;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Activity {
    Start,
    End,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Start => f.write_str("START"),
            Activity::End => f.write_str("END"),
        }
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "START" => Ok(Activity::Start),
            "END" => Ok(Activity::End),
            other => Err(format!("unknown activity {other:?}, expected START or END")),
        }
    }
}

/// A parsed time of day, or the marker for text that was not `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    Valid(Time),
    Invalid,
}

impl Stamp {
    pub fn parse(raw: &str) -> Self {
        Time::parse(raw, TIMESTAMP_FORMAT)
            .map(Stamp::Valid)
            .unwrap_or(Stamp::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub line: usize,
    pub timestamp: Time,
    pub name: String,
    pub activity: Activity,
    pub job_id: i64,
}

struct ParsedRow {
    line: usize,
    raw_timestamp: String,
    stamp: Stamp,
    name: String,
    activity: Activity,
    job_id: i64,
}

fn parse_row(row: &RawRow) -> BatchResult<ParsedRow> {
    let malformed = |reason: String| BatchError::MalformedRecord {
        line: row.line,
        reason,
    };

    if row.fields.len() != COLUMNS {
        return Err(malformed(format!(
            "expected {COLUMNS} columns (timestamp,name,activity,job_id), found {}",
            row.fields.len()
        )));
    }

    let raw_timestamp = row.fields[0].clone();
    let activity = row.fields[2].parse::<Activity>().map_err(malformed)?;
    let raw_job = row.fields[3].trim();
    let job_id = raw_job
        .parse::<i64>()
        .map_err(|_| malformed(format!("job_id {raw_job:?} is not a 64-bit integer")))?;

    Ok(ParsedRow {
        line: row.line,
        stamp: Stamp::parse(&raw_timestamp),
        raw_timestamp,
        name: row.fields[1].clone(),
        activity,
        job_id,
    })
}

/// Parses every row, then requires timestamps to be non-decreasing across
/// the whole batch. An unparsable timestamp counts as an ordering break.
pub fn validate(rows: &[RawRow], diag: &dyn DiagnosticsSink) -> BatchResult<Vec<LogRecord>> {
    let parsed = rows.iter().map(parse_row).collect::<BatchResult<Vec<_>>>()?;

    let mut records = Vec::with_capacity(parsed.len());
    let mut prev: Option<Time> = None;
    for row in parsed {
        let ts = match (row.stamp, prev) {
            (Stamp::Valid(ts), Some(p)) if ts >= p => ts,
            (Stamp::Valid(ts), None) => ts,
            _ => {
                diag.emit(Diagnostic::OrderingViolation {
                    line: row.line,
                    timestamp: row.raw_timestamp.clone(),
                });
                return Err(BatchError::Ordering {
                    line: row.line,
                    timestamp: row.raw_timestamp,
                });
            }
        };
        prev = Some(ts);
        records.push(LogRecord {
            line: row.line,
            timestamp: ts,
            name: row.name,
            activity: row.activity,
            job_id: row.job_id,
        });
    }

    diag.emit(Diagnostic::RowsLoaded {
        rows: records.len(),
    });
    Ok(records)
}
