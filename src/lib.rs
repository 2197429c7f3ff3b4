//! Containerized scan-task orchestration.
//!
//! One [`Orchestrator`] instance accepts scan tasks through a non-blocking
//! [`enqueue`](Orchestrator::enqueue), launches a detached container per task
//! against a [`ContainerRuntime`], polls container lifecycle on a fixed
//! interval, persists captured results through a [`ResultSink`], and reports
//! completion exactly once per task through a callback. A [`ScanBackend`]
//! supplies the per-tool command line and volume/environment bindings, so the
//! same engine serves every scanning tool.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scandock::{
//!     CliRuntime, FsSink, Orchestrator, OrchestratorConfig, ScoutBackend, ScoutTask,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = OrchestratorConfig::new("scout", "rossja/ncc-scoutsuite:aws-latest", "./output");
//! let backend = ScoutBackend::new("/home/user/.aws/credentials");
//! let sink = Arc::new(FsSink::new("./output"));
//!
//! let mut orchestrator = Orchestrator::new(
//!     config,
//!     backend,
//!     Arc::new(CliRuntime::new()),
//!     sink,
//!     Arc::new(|task: &ScoutTask, success| {
//!         println!("{} finished, success={success}", task.label);
//!     }),
//! )?;
//!
//! orchestrator.enqueue(ScoutTask {
//!     label: "audit-prod".into(),
//!     role_arn: None,
//!     command: None,
//! });
//! orchestrator.shutdown(true);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod docker;
pub mod orchestrator;
pub mod sink;

pub use backend::{
    LaunchPlan, NucleiBackend, NucleiTask, ScanBackend, ScoutBackend, ScoutTask, ShodanBackend,
    ShodanTask,
};
pub use config::{ConfigOverrides, OrchestratorConfig};
pub use docker::{
    CliRuntime, ContainerHandle, ContainerRuntime, ContainerState, ContainerStatus, LogStream,
    Mount, RunSpec, RuntimeError,
};
pub use orchestrator::{CompletionCallback, Orchestrator, Task};
pub use sink::{FsSink, ResultSink, TaskRecord};
