use crate::{
    config::Config,
    diagnostics::TracingDiagnostics,
    error::BatchError,
    pipeline::{BatchOutcome, Pipeline},
    sink::{FileSink, ReportSink, StdoutSink},
    source::FileSource,
    util::{ensure_dir, hash_file, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_CONFIG: &str = "joblog-check.toml";

#[derive(Parser, Debug)]
#[command(name = "joblog-check")]
#[command(about = "Reconciles START/END job log records and reports jobs that ran too long")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./joblog-check.toml if present, else defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate, reconcile and classify, then write the report.
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write the report to stdout instead of a file.
        #[arg(long, conflicts_with = "report")]
        stdout: bool,
    },
    /// Validate, reconcile and classify without writing a report.
    Check {
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;

    match &args.cmd {
        Command::Run {
            input,
            report,
            stdout,
        } => run(&cfg, input.as_deref(), report.as_deref(), *stdout),
        Command::Check { input } => check(&cfg, input.as_deref()),
    }
}

/// Exit status for a failed run: 2 when the input was rejected, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<BatchError>())
        .map(BatchError::exit_code)
        .unwrap_or(1)
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from(DEFAULT_CONFIG);
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries reports and summaries
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    let report = PathBuf::from(&cfg.paths.report);
    let dir = report.parent().unwrap_or_else(|| Path::new("."));
    Some(dir.join("joblog-check.log"))
}

fn run(cfg: &Config, input: Option<&Path>, report: Option<&Path>, to_stdout: bool) -> Result<()> {
    let input = input
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.input));
    let report_path = report
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.report));

    let started = now_rfc3339();
    let mut source = FileSource::new(&input);
    let mut sink: Box<dyn ReportSink> = if to_stdout {
        Box::new(StdoutSink)
    } else {
        Box::new(FileSink::new(&report_path))
    };

    info!("input={} report={}", input.display(), sink.describe());

    let mut pipeline = Pipeline::new(cfg);
    let outcome = pipeline
        .run_batch(&mut source, sink.as_mut(), &TracingDiagnostics)
        .with_context(|| format!("processing {}", input.display()))?;

    let summary = summarize(&outcome, &input, started);

    if cfg.output.write_summary_json && !to_stdout {
        let dir = report_path.parent().unwrap_or_else(|| Path::new("."));
        let path = dir.join(&cfg.output.summary_filename);
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing summary: {}", path.display()))?;
    }

    if cfg.output.print_summary && !to_stdout {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn check(cfg: &Config, input: Option<&Path>) -> Result<()> {
    let input = input
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.input));

    let started = now_rfc3339();
    let mut pipeline = Pipeline::new(cfg);
    let outcome = pipeline
        .evaluate(&mut FileSource::new(&input), &TracingDiagnostics)
        .with_context(|| format!("checking {}", input.display()))?;

    let summary = summarize(&outcome, &input, started);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize(outcome: &BatchOutcome, input: &Path, started: String) -> crate::report::BatchSummary {
    let input_sha256 = match hash_file(input) {
        Ok(h) => Some(h),
        Err(err) => {
            warn!("could not fingerprint input: {err:#}");
            None
        }
    };
    outcome.summary(
        input.display().to_string(),
        input_sha256,
        started,
        now_rfc3339(),
    )
}
