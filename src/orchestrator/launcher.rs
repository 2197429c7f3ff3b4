use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, error, info};

use crate::backend::{LaunchPlan, ScanBackend};
use crate::config::OrchestratorConfig;
use crate::docker::{RunSpec, invoking_user};
use crate::orchestrator::Task;

use super::engine::Shared;
use super::registry::RegistryEntry;

/// Launcher thread body: drain the pending queue in batches and turn each
/// task into a detached container. Never waits for a container to exit.
pub(super) fn run<B: ScanBackend>(shared: Arc<Shared<B>>) {
    while let Some(batch) = shared.queue.wait_batch() {
        debug!(count = batch.len(), "launching batch");
        for task in batch {
            launch_one(&shared, task);
        }
    }
    shared.launcher_active.store(false, Ordering::Release);
    info!("launcher exiting");
}

fn launch_one<B: ScanBackend>(shared: &Shared<B>, task: Arc<B::Task>) {
    let label = task.label().to_string();

    // Reserved before launch so the container can mount it.
    let task_dir = shared.config.output_dir.join(&label);
    if let Err(e) = std::fs::create_dir_all(&task_dir) {
        error!(label = %label, error = %e, "could not create task output directory");
        (shared.callback)(task.as_ref(), false);
        return;
    }

    let plan = shared.backend.plan(&task, &task_dir);
    let spec = build_run_spec(&shared.config, plan, &label);

    match shared.runtime.create_and_start(&spec) {
        Ok(handle) => {
            debug!(label = %label, id = %handle, "scan container started");
            shared.registry.insert(RegistryEntry { handle, task });
        }
        Err(e) => {
            // The one place a task fails synchronously at launch time rather
            // than through the poller. Nothing is registered for it.
            error!(label = %label, error = %e, "scan launch failed");
            (shared.callback)(task.as_ref(), false);
        }
    }
}

/// Merge the orchestrator's static bindings with one task's launch plan.
fn build_run_spec(config: &OrchestratorConfig, plan: LaunchPlan, label: &str) -> RunSpec {
    let mut volumes = config.volumes.clone();
    volumes.extend(plan.volumes);

    let mut env = config.env.clone();
    env.extend(plan.env);

    RunSpec {
        image: config.image.clone(),
        command: plan.command,
        labels: vec![(config.task_label_key(), label.to_string())],
        volumes,
        env,
        working_dir: plan.working_dir,
        user: if config.run_as_invoking_user {
            invoking_user()
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::Mount;

    #[test]
    fn run_spec_merges_static_and_plan_bindings() {
        let mut config = OrchestratorConfig::new("scout", "rossja/ncc-scoutsuite:aws-latest", "/out");
        config.volumes = vec![Mount::read_only("/home/u/.aws/credentials", "/root/.aws/credentials")];
        config.env = vec![("AWS_REGION".into(), "eu-north-1".into())];

        let plan = LaunchPlan {
            command: vec!["scout".into(), "aws".into()],
            volumes: vec![Mount::read_write("/out/t1", "/root/output")],
            env: vec![("SCOUT_FLAGS".into(), "--quiet".into())],
            working_dir: Some("/root".into()),
        };

        let spec = build_run_spec(&config, plan, "t1");

        assert_eq!(spec.image, "rossja/ncc-scoutsuite:aws-latest");
        assert_eq!(spec.volumes.len(), 2);
        assert_eq!(spec.env.len(), 2);
        assert_eq!(
            spec.labels,
            vec![("scout-task-id".to_string(), "t1".to_string())]
        );
        assert_eq!(spec.working_dir.as_deref(), Some("/root"));
        assert!(spec.user.is_none());
    }

    #[test]
    fn run_spec_sets_user_when_configured() {
        let mut config = OrchestratorConfig::new("scout", "alpine", "/out");
        config.run_as_invoking_user = true;

        let spec = build_run_spec(&config, LaunchPlan::default(), "t1");

        #[cfg(unix)]
        assert!(spec.user.is_some());
    }
}
