use crate::{
    classify::{classify, DurationResult, Severity, Thresholds},
    diagnostics::{Diagnostic, DiagnosticsSink},
    error::{BatchError, BatchResult},
    reconcile::JobWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classified jobs plus the report text they produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    /// One entry per window, ascending by job_id.
    pub results: Vec<DurationResult>,
}

impl Report {
    pub fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &DurationResult> {
        self.results.iter().filter(|r| r.severity != Severity::None)
    }
}

/// Classifies every window and concatenates the flagged lines in job_id
/// order. Any negative duration fails the whole report.
pub fn build_report(
    windows: &BTreeMap<i64, JobWindow>,
    thresholds: &Thresholds,
    diag: &dyn DiagnosticsSink,
) -> BatchResult<Report> {
    let mut results = Vec::with_capacity(windows.len());
    for window in windows.values() {
        match classify(window, thresholds) {
            Ok(r) => results.push(r),
            Err(err) => {
                if let BatchError::NegativeDuration {
                    job_id,
                    duration_seconds,
                } = &err
                {
                    diag.emit(Diagnostic::NegativeDuration {
                        job_id: *job_id,
                        duration_seconds: *duration_seconds,
                    });
                }
                return Err(err);
            }
        }
    }

    let mut text = String::new();
    let mut lines = 0;
    for r in &results {
        if let Some(line) = r.report_line() {
            diag.emit(Diagnostic::ThresholdExceeded {
                job_id: r.job_id,
                duration_seconds: r.duration_seconds,
                severity: r.severity,
            });
            text.push_str(&line);
            lines += 1;
        }
    }

    diag.emit(Diagnostic::ReportGenerated {
        lines,
        bytes: text.len(),
    });
    Ok(Report { text, results })
}

/// Machine-readable outcome of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub input: String,
    pub input_sha256: Option<String>,
    pub started: String,
    pub finished: String,
    pub rows: usize,
    pub jobs: usize,
    pub dropped_jobs: Vec<i64>,
    pub warnings: usize,
    pub errors: usize,
    pub report_bytes: usize,
    pub flagged: Vec<DurationResult>,
}
