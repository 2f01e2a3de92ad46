use crate::error::{BatchError, BatchResult};
use crate::util::ensure_dir;
use std::io::Write;
use std::path::PathBuf;

/// Persists finished report text. Called at most once per batch, and only
/// after every job has been classified.
pub trait ReportSink {
    fn describe(&self) -> String;
    fn write_report(&mut self, text: &str) -> BatchResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for FileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write_report(&mut self, text: &str) -> BatchResult<()> {
        let sink_err = |source| BatchError::SinkWrite {
            target: self.describe(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent).map_err(|e| sink_err(std::io::Error::other(format!("{e:#}"))))?;
        }
        std::fs::write(&self.path, text).map_err(sink_err)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn describe(&self) -> String {
        "<stdout>".to_string()
    }

    fn write_report(&mut self, text: &str) -> BatchResult<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|source| BatchError::SinkWrite {
                target: self.describe(),
                source,
            })
    }
}

/// Captures the report in memory. `writes` counts sink invocations.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub text: String,
    pub writes: usize,
}

impl ReportSink for MemorySink {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn write_report(&mut self, text: &str) -> BatchResult<()> {
        self.text.push_str(text);
        self.writes += 1;
        Ok(())
    }
}
