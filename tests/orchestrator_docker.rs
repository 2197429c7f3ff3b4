//! End-to-end orchestration tests against a real Docker daemon.
//!
//! These require a running Docker daemon and the `alpine` image; they are
//! marked `#[ignore]`. Run with: `cargo test -- --ignored`

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use scandock::{
    CliRuntime, CompletionCallback, ContainerRuntime, FsSink, LaunchPlan, Orchestrator,
    OrchestratorConfig, ResultSink, ScanBackend, Task,
};

/// Runs an arbitrary command in the configured image; the per-tool backends
/// are exercised by their own unit tests, while these tests only need
/// containers with controllable lifetimes.
struct ShellBackend;

#[derive(Debug, Clone)]
struct ShellTask {
    label: String,
    command: Vec<String>,
}

impl ShellTask {
    fn new(label: &str, command: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Task for ShellTask {
    fn label(&self) -> &str {
        &self.label
    }
}

impl ScanBackend for ShellBackend {
    type Task = ShellTask;

    fn plan(&self, task: &ShellTask, _task_dir: &Path) -> LaunchPlan {
        LaunchPlan {
            command: task.command.clone(),
            ..LaunchPlan::default()
        }
    }
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, bool)>>>,
}

impl Recorder {
    fn callback(&self) -> CompletionCallback<ShellTask> {
        let calls = Arc::clone(&self.calls);
        Arc::new(move |task: &ShellTask, success| {
            calls.lock().unwrap().push((task.label.clone(), success));
        })
    }

    fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

fn config(output: &Path) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new("e2e", "alpine", output);
    config.poll_interval = Duration::from_secs(1);
    config.timeout = Duration::from_secs(5);
    config
}

fn orchestrator(
    output: &Path,
    recorder: &Recorder,
) -> anyhow::Result<Orchestrator<ShellBackend>> {
    Orchestrator::new(
        config(output),
        ShellBackend,
        Arc::new(CliRuntime::new()) as Arc<dyn ContainerRuntime>,
        Arc::new(FsSink::new(output)) as Arc<dyn ResultSink>,
        recorder.callback(),
    )
}

#[test]
#[ignore]
fn short_lived_container_completes_and_persists_status() {
    let output = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::default();
    let mut orchestrator = orchestrator(output.path(), &recorder).expect("construct");

    orchestrator.enqueue(ShellTask::new("sleep-2", &["sleep", "2"]));
    orchestrator.shutdown(true);

    assert_eq!(recorder.calls(), vec![("sleep-2".to_string(), true)]);

    let summary =
        std::fs::read_to_string(output.path().join("sleep-2/result.json")).expect("result.json");
    assert!(summary.contains("\"status_code\": 0"));
}

#[test]
#[ignore]
fn tool_exit_code_is_captured_not_judged() {
    let output = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::default();
    let mut orchestrator = orchestrator(output.path(), &recorder).expect("construct");

    orchestrator.enqueue(ShellTask::new("exit-3", &["sh", "-c", "exit 3"]));
    orchestrator.shutdown(true);

    assert_eq!(recorder.calls(), vec![("exit-3".to_string(), true)]);

    let summary =
        std::fs::read_to_string(output.path().join("exit-3/result.json")).expect("result.json");
    assert!(summary.contains("\"status_code\": 3"));
}

#[test]
#[ignore]
fn container_output_reaches_the_sink() {
    let output = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::default();
    let mut orchestrator = orchestrator(output.path(), &recorder).expect("construct");

    orchestrator.enqueue(ShellTask::new(
        "echo",
        &["sh", "-c", "echo scan-finding; echo scan-warning >&2"],
    ));
    orchestrator.shutdown(true);

    let stdout = std::fs::read_to_string(output.path().join("echo/stdout.txt")).expect("stdout");
    assert!(stdout.contains("scan-finding"));
    let stderr = std::fs::read_to_string(output.path().join("echo/stderr.txt")).expect("stderr");
    assert!(stderr.contains("scan-warning"));
}

#[test]
#[ignore]
fn forced_shutdown_removes_a_long_runner_without_callback() {
    let output = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::default();
    let mut orchestrator = orchestrator(output.path(), &recorder).expect("construct");

    let start = Instant::now();
    orchestrator.enqueue(ShellTask::new("long", &["sleep", "600"]));
    assert!(
        start.elapsed() < Duration::from_millis(200),
        "enqueue must return before the container runs"
    );

    // Give the launcher time to start the container, then abandon it.
    std::thread::sleep(Duration::from_secs(1));
    orchestrator.shutdown(false);

    assert!(recorder.calls().is_empty());
    assert!(
        start.elapsed() < Duration::from_secs(30),
        "forced shutdown must not wait for the container"
    );
}

#[test]
#[ignore]
fn staggered_batch_all_complete_exactly_once() {
    let output = tempfile::tempdir().expect("tempdir");
    let recorder = Recorder::default();
    let mut orchestrator = orchestrator(output.path(), &recorder).expect("construct");

    for i in 1..=5u64 {
        let seconds = format!("{}", 1 + i % 3);
        orchestrator.enqueue(ShellTask::new(
            &format!("batch-{i}"),
            &["sleep", seconds.as_str()],
        ));
    }
    orchestrator.shutdown(true);

    let calls = recorder.calls();
    assert_eq!(calls.len(), 5);
    for i in 1..=5 {
        let label = format!("batch-{i}");
        assert_eq!(
            calls.iter().filter(|(l, ok)| *l == label && *ok).count(),
            1,
            "{label} must complete exactly once"
        );
    }
}
