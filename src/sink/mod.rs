// Result persistence — where captured scan output lands once a container
// finishes.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::Serialize;

/// Everything captured from one finished scan container.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub label: String,
    /// Exit status of the scan tool, as reported by the runtime. The
    /// orchestrator does not interpret it.
    pub status_code: i64,
    pub finished_at: SystemTime,
    #[serde(skip)]
    pub stdout: Vec<u8>,
    #[serde(skip)]
    pub stderr: Vec<u8>,
}

/// Destination for completed task results. Implementations own format and
/// layout; the poller only hands over the record.
pub trait ResultSink: Send + Sync {
    fn persist(&self, record: &TaskRecord) -> Result<()>;
}

/// Writes each task's results under `<root>/<label>/`: a `result.json`
/// summary plus the raw stream dumps.
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResultSink for FsSink {
    fn persist(&self, record: &TaskRecord) -> Result<()> {
        let dir = self.root.join(&record.label);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating result directory {}", dir.display()))?;

        let summary = serde_json::to_vec_pretty(record).context("serializing result record")?;
        std::fs::write(dir.join("result.json"), summary)
            .with_context(|| format!("writing result.json for {}", record.label))?;
        std::fs::write(dir.join("stdout.txt"), &record.stdout)
            .with_context(|| format!("writing stdout.txt for {}", record.label))?;
        std::fs::write(dir.join("stderr.txt"), &record.stderr)
            .with_context(|| format!("writing stderr.txt for {}", record.label))?;
        Ok(())
    }
}
