use std::path::Path;

use super::{LaunchPlan, ScanBackend};
use crate::docker::Mount;
use crate::orchestrator::Task;

const OUTDIR_CONTAINER_MOUNT: &str = "/root/output";

/// Shodan collector backend: runs the collector script against one IP prefix
/// per task. The API key travels as container environment, never on the
/// command line.
pub struct ShodanBackend {
    api_key: String,
}

impl ShodanBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

/// One prefix collection run.
#[derive(Debug, Clone)]
pub struct ShodanTask {
    pub label: String,
    pub ip_prefix: String,
}

impl Task for ShodanTask {
    fn label(&self) -> &str {
        &self.label
    }
}

impl ScanBackend for ShodanBackend {
    type Task = ShodanTask;

    fn plan(&self, task: &ShodanTask, task_dir: &Path) -> LaunchPlan {
        LaunchPlan {
            command: vec![
                "python".into(),
                "./shodan_script.py".into(),
                task.ip_prefix.clone(),
            ],
            volumes: vec![Mount::read_write(task_dir, OUTDIR_CONTAINER_MOUNT)],
            env: vec![("shodan_api_key".into(), self.api_key.clone())],
            working_dir: Some("/root".into()),
        }
    }
}
