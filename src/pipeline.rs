use crate::{
    classify::{Severity, Thresholds},
    config::Config,
    diagnostics::DiagnosticsSink,
    error::BatchResult,
    reconcile::reconcile,
    record::validate,
    report::{build_report, BatchSummary, Report},
    sink::ReportSink,
    source::RecordSource,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Ingesting,
    Reconciling,
    Classifying,
    Reported,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub rows: usize,
    pub dropped: Vec<i64>,
    pub report: Report,
}

impl BatchOutcome {
    pub fn summary(
        &self,
        input: String,
        input_sha256: Option<String>,
        started: String,
        finished: String,
    ) -> BatchSummary {
        BatchSummary {
            input,
            input_sha256,
            started,
            finished,
            rows: self.rows,
            jobs: self.report.results.len(),
            dropped_jobs: self.dropped.clone(),
            warnings: self.report.count(Severity::Warning),
            errors: self.report.count(Severity::Error),
            report_bytes: self.report.text.len(),
            flagged: self.report.flagged().copied().collect(),
        }
    }
}

/// Runs one batch at a time through validate, reconcile and classify.
/// Any failure parks the pipeline in `Failed` and nothing reaches the sink.
pub struct Pipeline {
    thresholds: Thresholds,
    stage: BatchStage,
}

impl Pipeline {
    pub fn new(cfg: &Config) -> Self {
        Self::with_thresholds(Thresholds::from_config(cfg))
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            stage: BatchStage::Ingesting,
        }
    }

    pub fn stage(&self) -> BatchStage {
        self.stage
    }

    /// Validates and classifies without touching a sink.
    pub fn evaluate(
        &mut self,
        source: &mut dyn RecordSource,
        diag: &dyn DiagnosticsSink,
    ) -> BatchResult<BatchOutcome> {
        self.stage = BatchStage::Ingesting;
        let res = self.stages(source, diag);
        self.settle(res)
    }

    /// Full batch: the report is handed to `sink` only when every stage passed.
    pub fn run_batch(
        &mut self,
        source: &mut dyn RecordSource,
        sink: &mut dyn ReportSink,
        diag: &dyn DiagnosticsSink,
    ) -> BatchResult<BatchOutcome> {
        let outcome = self.evaluate(source, diag)?;
        let res = sink.write_report(&outcome.report.text).map(|_| outcome);
        let res = self.settle(res);
        if res.is_ok() {
            self.advance(BatchStage::Reported);
        }
        res
    }

    fn stages(
        &mut self,
        source: &mut dyn RecordSource,
        diag: &dyn DiagnosticsSink,
    ) -> BatchResult<BatchOutcome> {
        debug!(source = %source.describe(), "reading batch");
        let rows = source.read_rows()?;
        let records = validate(&rows, diag)?;

        self.advance(BatchStage::Reconciling);
        let rec = reconcile(&records, diag)?;

        self.advance(BatchStage::Classifying);
        let report = build_report(&rec.windows, &self.thresholds, diag)?;

        Ok(BatchOutcome {
            rows: records.len(),
            dropped: rec.dropped,
            report,
        })
    }

    fn settle<T>(&mut self, res: BatchResult<T>) -> BatchResult<T> {
        if let Err(err) = &res {
            debug!(stage = ?self.stage, "batch failed: {err}");
            self.stage = BatchStage::Failed;
        }
        res
    }

    fn advance(&mut self, next: BatchStage) {
        debug!(from = ?self.stage, to = ?next, "batch stage");
        self.stage = next;
    }
}

