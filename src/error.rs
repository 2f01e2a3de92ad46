use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::record::Activity;

/// Everything that can end a batch. Only `SourceUnavailable` happens before
/// any record is seen; the rest are verdicts on the data or the sink.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("input source unavailable: {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading input: {0}")]
    SourceRead(String),

    #[error("line {line}: malformed record: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error(
        "line {line}: timestamp {timestamp:?} is malformed or out of order; \
         timestamps must be HH:MM:SS and non-decreasing (multi-day logs are not supported)"
    )]
    Ordering { line: usize, timestamp: String },

    #[error("job_id={job_id} has more than one {activity} record")]
    DuplicateActivity { job_id: i64, activity: Activity },

    #[error("job_id={job_id} has a negative duration of {duration_seconds} seconds")]
    NegativeDuration { job_id: i64, duration_seconds: i64 },

    #[error("failed writing report to {target}")]
    SinkWrite {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    /// True when the run could not start at all.
    pub fn is_startup(&self) -> bool {
        matches!(self, BatchError::SourceUnavailable { .. })
    }

    /// True when the input was read but rejected.
    pub fn is_bad_data(&self) -> bool {
        matches!(
            self,
            BatchError::MalformedRecord { .. }
                | BatchError::Ordering { .. }
                | BatchError::DuplicateActivity { .. }
                | BatchError::NegativeDuration { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_bad_data() { 2 } else { 1 }
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
