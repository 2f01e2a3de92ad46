//! Diagnostic events raised by the batch stages.
//!
//! Stages never log directly. They hand [`Diagnostic`] values to a
//! [`DiagnosticsSink`] supplied by the caller, so a run can be observed
//! through `tracing` in the binary and through [`RecordingDiagnostics`] in tests.

use crate::classify::Severity;
use crate::record::Activity;
use std::cell::RefCell;
use std::fmt;
use tracing::{debug, error, info, trace, warn, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    RowsLoaded { rows: usize },
    OrderingViolation { line: usize, timestamp: String },
    DuplicateActivity { job_id: i64, activity: Activity },
    IncompleteJobsDropped { count: usize, job_ids: Vec<i64> },
    ThresholdExceeded {
        job_id: i64,
        duration_seconds: i64,
        severity: Severity,
    },
    NegativeDuration { job_id: i64, duration_seconds: i64 },
    ReportGenerated { lines: usize, bytes: usize },
}

impl Diagnostic {
    /// Log level for this event. Threshold hits log at the level matching
    /// their report severity.
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::RowsLoaded { .. } | Diagnostic::ReportGenerated { .. } => Level::INFO,
            Diagnostic::IncompleteJobsDropped { .. } => Level::WARN,
            Diagnostic::ThresholdExceeded { severity, .. } => match severity {
                Severity::Error => Level::ERROR,
                Severity::Warning => Level::WARN,
                Severity::None => Level::DEBUG,
            },
            Diagnostic::OrderingViolation { .. }
            | Diagnostic::DuplicateActivity { .. }
            | Diagnostic::NegativeDuration { .. } => Level::ERROR,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RowsLoaded { rows } => {
                write!(f, "input loaded successfully with {rows} rows")
            }
            Diagnostic::OrderingViolation { line, timestamp } => write!(
                f,
                "line {line}: timestamp {timestamp:?} is malformed or not in increasing order; \
                 expected HH:MM:SS in non-decreasing order"
            ),
            Diagnostic::DuplicateActivity { job_id, activity } => write!(
                f,
                "job_id={job_id}: duplicate {activity} activity; \
                 each job_id needs exactly one START and one END"
            ),
            Diagnostic::IncompleteJobsDropped { count, job_ids } => write!(
                f,
                "dropped {count} jobs missing a START or END activity: {job_ids:?}"
            ),
            Diagnostic::ThresholdExceeded {
                job_id,
                duration_seconds,
                ..
            } => write!(
                f,
                "Job with job_id={job_id} took {duration_seconds} seconds to complete."
            ),
            Diagnostic::NegativeDuration {
                job_id,
                duration_seconds,
            } => write!(
                f,
                "job_id={job_id} has a negative duration of {duration_seconds} seconds"
            ),
            Diagnostic::ReportGenerated { lines, bytes } => write!(
                f,
                "report generated successfully ({lines} lines, {bytes} bytes)"
            ),
        }
    }
}

pub trait DiagnosticsSink {
    fn emit(&self, event: Diagnostic);
}

/// Forwards events to `tracing` at [`Diagnostic::level`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn emit(&self, event: Diagnostic) {
        let level = event.level();
        if level == Level::ERROR {
            error!("{event}");
        } else if level == Level::WARN {
            warn!("{event}");
        } else if level == Level::INFO {
            info!("{event}");
        } else if level == Level::DEBUG {
            debug!("{event}");
        } else {
            trace!("{event}");
        }
    }
}

/// Keeps every event in order. Used by tests to assert what a run reported.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: RefCell<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    pub fn dropped_count(&self) -> Option<usize> {
        self.events.borrow().iter().find_map(|e| match e {
            Diagnostic::IncompleteJobsDropped { count, .. } => Some(*count),
            _ => None,
        })
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn emit(&self, event: Diagnostic) {
        self.events.borrow_mut().push(event);
    }
}
