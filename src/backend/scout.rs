use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{LaunchPlan, ScanBackend};
use crate::docker::Mount;
use crate::orchestrator::Task;

/// Where scan reports land inside the container.
const OUTDIR_CONTAINER_MOUNT: &str = "/root/output";

/// ScoutSuite cloud-audit backend: one container per audited account, with
/// the credentials file mounted read-only and the report directory mounted
/// back out to the task's result directory.
pub struct ScoutBackend {
    credentials_file: PathBuf,
    /// Replaces the default `scout aws ...` command line when set.
    command_override: Option<Vec<String>>,
}

impl ScoutBackend {
    pub fn new(credentials_file: impl Into<PathBuf>) -> Self {
        Self {
            credentials_file: credentials_file.into(),
            command_override: None,
        }
    }

    /// Parse a shell-style command override, e.g. from a config file.
    pub fn with_command_str(mut self, command: &str) -> Result<Self> {
        let words = shell_words::split(command)
            .with_context(|| format!("unparsable scout command override {command:?}"))?;
        self.command_override = Some(words);
        Ok(self)
    }
}

/// One ScoutSuite audit run.
#[derive(Debug, Clone)]
pub struct ScoutTask {
    pub label: String,
    /// Role assumed for the audit, forwarded to the tool when present.
    pub role_arn: Option<String>,
    /// Per-task command override; takes precedence over the backend's.
    pub command: Option<Vec<String>>,
}

impl Task for ScoutTask {
    fn label(&self) -> &str {
        &self.label
    }
}

impl ScanBackend for ScoutBackend {
    type Task = ScoutTask;

    fn plan(&self, task: &ScoutTask, task_dir: &Path) -> LaunchPlan {
        let command = task
            .command
            .clone()
            .or_else(|| self.command_override.clone())
            .unwrap_or_else(|| default_command(task.role_arn.as_deref()));

        LaunchPlan {
            command,
            volumes: vec![
                Mount::read_only(&self.credentials_file, "/root/.aws/credentials"),
                Mount::read_write(task_dir, OUTDIR_CONTAINER_MOUNT),
            ],
            env: Vec::new(),
            working_dir: Some("/root".into()),
        }
    }
}

fn default_command(role_arn: Option<&str>) -> Vec<String> {
    let mut command: Vec<String> = [
        "scout",
        "aws",
        "--no-browser",
        "--result-format",
        "json",
        "--report-dir",
        OUTDIR_CONTAINER_MOUNT,
        "--logfile",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    command.push(format!("{OUTDIR_CONTAINER_MOUNT}/scout.log"));
    if let Some(arn) = role_arn {
        command.push("--exceptions".into());
        command.push(arn.to_string());
    }
    command
}
