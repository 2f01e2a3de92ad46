use joblog_check::{
    classify::{Severity, Thresholds},
    diagnostics::{Diagnostic, RecordingDiagnostics},
    pipeline::{BatchStage, Pipeline},
    sink::{FileSink, MemorySink},
    source::{FileSource, MemorySource},
    BatchError,
};

fn run(lines: &[&str]) -> (Result<String, BatchError>, MemorySink, BatchStage) {
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let mut sink = MemorySink::default();
    let diag = RecordingDiagnostics::new();
    let res = pipeline
        .run_batch(&mut MemorySource::from_lines(lines), &mut sink, &diag)
        .map(|o| o.report.text);
    (res, sink, pipeline.stage())
}

#[test]
fn single_slow_job_end_to_end() {
    let (res, sink, stage) = run(&["00:00:00,alice,START,1", "00:10:02,alice,END,1"]);
    let expected = "ERROR: Job with job_id=1 took 602 seconds to complete.\n";
    assert_eq!(res.unwrap(), expected);
    assert_eq!(sink.text, expected);
    assert_eq!(sink.writes, 1);
    assert_eq!(stage, BatchStage::Reported);
}

#[test]
fn missing_input_file_is_a_startup_failure() {
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let mut sink = MemorySink::default();
    let err = pipeline
        .run_batch(
            &mut FileSource::new("data/nofile.log"),
            &mut sink,
            &RecordingDiagnostics::new(),
        )
        .unwrap_err();
    assert!(err.is_startup());
    assert_eq!(sink.writes, 0);
    assert_eq!(pipeline.stage(), BatchStage::Failed);
}

#[test]
fn malformed_timestamp_fails_ordering() {
    let (res, sink, stage) = run(&[
        "00:00:00,alice,START,1",
        "00:01,alice,END,1",
        "00:02:00,bob,START,2",
    ]);
    assert!(matches!(res, Err(BatchError::Ordering { line: 2, .. })));
    assert_eq!(sink.writes, 0);
    assert_eq!(stage, BatchStage::Failed);
}

#[test]
fn unsorted_input_fails_ordering() {
    let (res, sink, _) = run(&[
        "00:00:10,alice,START,1",
        "00:00:05,bob,START,2",
        "00:00:20,alice,END,1",
    ]);
    assert!(matches!(res, Err(BatchError::Ordering { line: 2, .. })));
    assert_eq!(sink.writes, 0);
}

#[test]
fn rollover_past_midnight_is_rejected() {
    let (res, _, _) = run(&["23:59:00,alice,START,1", "00:01:00,alice,END,1"]);
    assert!(matches!(res, Err(BatchError::Ordering { .. })));
}

#[test]
fn incomplete_jobs_are_dropped_and_counted() {
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let diag = RecordingDiagnostics::new();
    let outcome = pipeline
        .evaluate(
            &mut MemorySource::from_lines(&[
                "00:00:00,a,START,1",
                "00:00:01,b,START,2",
                "00:00:02,c, START,3",
                "00:00:03,d,END,4",
                "00:00:04,a,END,1",
                "00:00:05,b,END ,2",
                "00:00:06,e,START,5",
                "00:00:07,c,END,3",
            ]),
            &diag,
        )
        .unwrap();
    assert_eq!(outcome.rows, 8);
    assert_eq!(outcome.report.results.len(), 3);
    assert_eq!(outcome.dropped, vec![4, 5]);
    assert_eq!(diag.dropped_count(), Some(2));
    assert_eq!(pipeline.stage(), BatchStage::Classifying);
}

#[test]
fn duplicate_start_rejects_batch_even_with_valid_jobs() {
    let (res, sink, stage) = run(&[
        "00:00:00,a,START,1",
        "00:00:01,a,END,1",
        "00:00:02,b,START,2",
        "00:00:03,b,START,2",
        "00:00:04,b,END,2",
    ]);
    assert!(matches!(
        res,
        Err(BatchError::DuplicateActivity { job_id: 2, .. })
    ));
    assert_eq!(sink.writes, 0);
    assert_eq!(stage, BatchStage::Failed);
}

#[test]
fn negative_duration_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.log");
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let err = pipeline
        .run_batch(
            &mut MemorySource::from_lines(&[
                "00:00:00,a,START,1",
                "00:00:01,b,END,2",
                "00:20:00,a,END,1",
                "00:30:00,b,START,2",
            ]),
            &mut FileSink::new(&report),
            &RecordingDiagnostics::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BatchError::NegativeDuration {
            job_id: 2,
            duration_seconds: -1799
        }
    ));
    assert!(!report.exists());
}

#[test]
fn warning_and_error_lines_in_job_order() {
    let (res, _, _) = run(&[
        "00:00:00,a,START,9",
        "00:00:00,b,START,2",
        "00:05:01,b,END,2",
        "00:10:01,a,END,9",
    ]);
    assert_eq!(
        res.unwrap(),
        "WARNING: Job with job_id=2 took 301 seconds to complete.\n\
         ERROR: Job with job_id=9 took 601 seconds to complete.\n"
    );
}

#[test]
fn quiet_batch_writes_empty_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.log");
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let diag = RecordingDiagnostics::new();
    let outcome = pipeline
        .run_batch(
            &mut MemorySource::from_lines(&[
                "00:00:00,a,START,1",
                "00:04:59,a,END,1",
                "00:05:00,b,START,2",
                "00:10:00,b,END,2",
            ]),
            &mut FileSink::new(&report),
            &diag,
        )
        .unwrap();
    assert!(outcome.report.text.is_empty());
    assert_eq!(outcome.report.count(Severity::None), 2);
    assert_eq!(std::fs::read(&report).unwrap(), b"");
    assert!(diag
        .events()
        .contains(&Diagnostic::ReportGenerated { lines: 0, bytes: 0 }));
}

#[test]
fn summary_counts_flagged_jobs() {
    let mut pipeline = Pipeline::with_thresholds(Thresholds {
        warning_seconds: 10,
        error_seconds: 20,
    });
    let outcome = pipeline
        .evaluate(
            &mut MemorySource::from_lines(&[
                "00:00:00,a,START,1",
                "00:00:00,b,START,2",
                "00:00:00,c,START,3",
                "00:00:05,a,END,1",
                "00:00:15,b,END,2",
                "00:00:25,c,END,3",
                "00:00:30,d,END,4",
            ]),
            &RecordingDiagnostics::new(),
        )
        .unwrap();
    let summary = outcome.summary("<memory>".into(), None, "t0".into(), "t1".into());
    assert_eq!(summary.rows, 7);
    assert_eq!(summary.jobs, 3);
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.dropped_jobs, vec![4]);
    assert_eq!(summary.flagged.len(), 2);
    assert_eq!(summary.report_bytes, outcome.report.text.len());
}

#[test]
fn ordering_error_points_at_physical_line() {
    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let diag = RecordingDiagnostics::new();
    let err = pipeline
        .evaluate(
            &mut MemorySource::new("00:00:05,a,START,1\n\n\n00:00:01,a,END,1\n"),
            &diag,
        )
        .unwrap_err();
    assert!(matches!(err, BatchError::Ordering { line: 4, .. }));
    assert!(matches!(
        diag.events().as_slice(),
        [Diagnostic::OrderingViolation { line: 4, .. }]
    ));
}

#[test]
fn non_utf8_names_are_not_a_startup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logs.log");
    std::fs::write(&input, b"00:00:00,Jos\xe9,START,1\n00:10:02,Jos\xe9,END,1\n").unwrap();

    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let outcome = pipeline
        .evaluate(&mut FileSource::new(&input), &RecordingDiagnostics::new())
        .unwrap();
    assert_eq!(
        outcome.report.text,
        "ERROR: Job with job_id=1 took 602 seconds to complete.\n"
    );
}

#[test]
fn non_utf8_timestamp_is_bad_data_with_a_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logs.log");
    std::fs::write(&input, b"00:00:00,a,START,1\n00:0\xff:02,a,END,1\n").unwrap();

    let mut pipeline = Pipeline::with_thresholds(Thresholds::default());
    let err = pipeline
        .evaluate(&mut FileSource::new(&input), &RecordingDiagnostics::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::Ordering { line: 2, .. }));
    assert!(err.is_bad_data());
    assert_eq!(err.exit_code(), 2);
}
