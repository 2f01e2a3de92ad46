use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::{BatchError, BatchResult};
use crate::record::{Activity, LogRecord};
use std::collections::BTreeMap;
use time::Time;

/// START/END pair for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobWindow {
    pub job_id: i64,
    pub start: Time,
    pub end: Time,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Complete jobs, ascending by job_id.
    pub windows: BTreeMap<i64, JobWindow>,
    /// Jobs missing START or END, ascending.
    pub dropped: Vec<i64>,
}

impl Reconciliation {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Default)]
struct Roles {
    start: Option<Time>,
    end: Option<Time>,
}

/// Pairs one START with one END per job_id. A second record with the same
/// role for a job rejects the whole batch; jobs lacking a role are dropped.
pub fn reconcile(records: &[LogRecord], diag: &dyn DiagnosticsSink) -> BatchResult<Reconciliation> {
    let mut by_job: BTreeMap<i64, Roles> = BTreeMap::new();

    for rec in records {
        let roles = by_job.entry(rec.job_id).or_default();
        let slot = match rec.activity {
            Activity::Start => &mut roles.start,
            Activity::End => &mut roles.end,
        };
        if slot.is_some() {
            diag.emit(Diagnostic::DuplicateActivity {
                job_id: rec.job_id,
                activity: rec.activity,
            });
            return Err(BatchError::DuplicateActivity {
                job_id: rec.job_id,
                activity: rec.activity,
            });
        }
        *slot = Some(rec.timestamp);
    }

    let mut out = Reconciliation::default();
    for (job_id, roles) in by_job {
        match (roles.start, roles.end) {
            (Some(start), Some(end)) => {
                out.windows.insert(job_id, JobWindow { job_id, start, end });
            }
            _ => out.dropped.push(job_id),
        }
    }

    if !out.dropped.is_empty() {
        diag.emit(Diagnostic::IncompleteJobsDropped {
            count: out.dropped.len(),
            job_ids: out.dropped.clone(),
        });
    }

    Ok(out)
}
