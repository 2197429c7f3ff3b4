use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::{LaunchPlan, ScanBackend};
use crate::config::OrchestratorConfig;
use crate::docker::{ContainerRuntime, Mount, RunSpec};
use crate::orchestrator::Task;

const OUTDIR_CONTAINER_MOUNT: &str = "/root/output";
const TEMPLATES_MOUNTPOINT: &str = "/root/nuclei-templates";

/// A template refresh downloads the whole template corpus; give it far more
/// room than a routine inspection call.
const TEMPLATE_REFRESH_TIMEOUT: Duration = Duration::from_secs(600);

/// Nuclei template-scan backend. Tasks select targets and templates; the
/// template corpus lives in one shared host directory refreshed once during
/// `prepare` and mounted read-only into every scan container.
pub struct NucleiBackend {
    templates_dir: PathBuf,
}

impl NucleiBackend {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }
}

/// One nuclei run over a set of targets.
#[derive(Debug, Clone)]
pub struct NucleiTask {
    pub label: String,
    pub targets: Vec<String>,
    /// Template paths inside the container (under the templates mountpoint).
    /// Empty means nuclei's default selection.
    pub templates: Vec<String>,
}

impl Task for NucleiTask {
    fn label(&self) -> &str {
        &self.label
    }
}

impl ScanBackend for NucleiBackend {
    type Task = NucleiTask;

    fn plan(&self, task: &NucleiTask, task_dir: &Path) -> LaunchPlan {
        let mut command = Vec::new();
        for target in &task.targets {
            command.push("-target".to_string());
            command.push(target.clone());
        }
        for template in &task.templates {
            command.push("-t".to_string());
            command.push(template.clone());
        }
        command.push("-disable-update-check".to_string());

        LaunchPlan {
            command,
            volumes: vec![
                Mount::read_only(&self.templates_dir, TEMPLATES_MOUNTPOINT),
                Mount::read_write(task_dir, OUTDIR_CONTAINER_MOUNT),
            ],
            env: Vec::new(),
            working_dir: Some("/root".into()),
        }
    }

    /// Refresh the shared template corpus with a one-shot foreground
    /// container before any task runs.
    fn prepare(&self, runtime: &dyn ContainerRuntime, config: &OrchestratorConfig) -> Result<()> {
        std::fs::create_dir_all(&self.templates_dir).with_context(|| {
            format!(
                "creating templates directory {}",
                self.templates_dir.display()
            )
        })?;

        info!(dir = %self.templates_dir.display(), "refreshing nuclei templates");
        let start = Instant::now();

        let spec = RunSpec {
            image: config.image.clone(),
            command: vec![
                "-update-templates".into(),
                format!("-ud={TEMPLATES_MOUNTPOINT}"),
            ],
            labels: vec![(config.task_label_key(), "template-refresh".into())],
            volumes: vec![Mount::read_write(&self.templates_dir, TEMPLATES_MOUNTPOINT)],
            env: Vec::new(),
            working_dir: Some("/root".into()),
            user: None,
        };

        let handle = runtime
            .create_and_start(&spec)
            .context("starting template refresh container")?;
        let status = runtime
            .wait(&handle, TEMPLATE_REFRESH_TIMEOUT)
            .context("waiting for template refresh")?;
        runtime
            .remove(&handle, false)
            .context("removing template refresh container")?;

        if status != 0 {
            bail!("template refresh exited with status {status}");
        }
        info!(elapsed = ?start.elapsed(), "template refresh finished");
        Ok(())
    }
}
