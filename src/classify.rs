use crate::config::Config;
use crate::error::{BatchError, BatchResult};
use crate::reconcile::JobWindow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    None,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> Option<&'static str> {
        match self {
            Severity::None => None,
            Severity::Warning => Some("WARNING"),
            Severity::Error => Some("ERROR"),
        }
    }
}

/// Durations strictly above a threshold trip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub warning_seconds: i64,
    pub error_seconds: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_seconds: 5 * 60,
            error_seconds: 10 * 60,
        }
    }
}

impl Thresholds {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            warning_seconds: cfg.thresholds.warning_seconds,
            error_seconds: cfg.thresholds.error_seconds,
        }
    }

    pub fn severity(&self, duration_seconds: i64) -> Severity {
        if duration_seconds > self.error_seconds {
            Severity::Error
        } else if duration_seconds > self.warning_seconds {
            Severity::Warning
        } else {
            Severity::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationResult {
    pub job_id: i64,
    pub duration_seconds: i64,
    pub severity: Severity,
}

impl DurationResult {
    /// The report line for this job, if it tripped a threshold.
    pub fn report_line(&self) -> Option<String> {
        self.severity.label().map(|label| {
            format!(
                "{label}: Job with job_id={} took {} seconds to complete.\n",
                self.job_id, self.duration_seconds
            )
        })
    }
}

pub fn classify(window: &JobWindow, thresholds: &Thresholds) -> BatchResult<DurationResult> {
    let duration_seconds = (window.end - window.start).whole_seconds();
    if duration_seconds < 0 {
        return Err(BatchError::NegativeDuration {
            job_id: window.job_id,
            duration_seconds,
        });
    }
    Ok(DurationResult {
        job_id: window.job_id,
        duration_seconds,
        severity: thresholds.severity(duration_seconds),
    })
}
