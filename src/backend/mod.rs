// Scan backends — per-tool strategies plugged into the one orchestration
// engine. A backend only decides what runs inside the container; launching,
// polling, and completion handling are shared.

pub mod nuclei;
pub mod scout;
pub mod shodan;

pub use nuclei::{NucleiBackend, NucleiTask};
pub use scout::{ScoutBackend, ScoutTask};
pub use shodan::{ShodanBackend, ShodanTask};

use std::path::Path;

use crate::config::OrchestratorConfig;
use crate::docker::{ContainerRuntime, Mount};
use crate::orchestrator::Task;

/// A backend's materialized container invocation for one task. The launcher
/// merges it with the orchestrator's static bindings and image.
#[derive(Debug, Clone, Default)]
pub struct LaunchPlan {
    pub command: Vec<String>,
    pub volumes: Vec<Mount>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<String>,
}

/// Per-tool strategy: how one task becomes a container invocation.
pub trait ScanBackend: Send + Sync + 'static {
    type Task: Task;

    /// Materialize the container invocation for one task. `task_dir` is the
    /// host directory reserved for this task's results; plans usually mount
    /// it read-write so the tool can write reports.
    fn plan(&self, task: &Self::Task, task_dir: &Path) -> LaunchPlan;

    /// One-shot setup before the orchestrator accepts tasks (template
    /// refresh, cache warm-up). Failures abort construction.
    fn prepare(
        &self,
        _runtime: &dyn ContainerRuntime,
        _config: &OrchestratorConfig,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
