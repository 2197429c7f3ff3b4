use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::backend::ScanBackend;
use crate::config::OrchestratorConfig;
use crate::docker::{CliRuntime, ContainerRuntime};
use crate::sink::ResultSink;

use super::launcher;
use super::poller;
use super::queue::TaskQueue;
use super::registry::Registry;
use super::types::{CompletionCallback, Task};

/// State shared between the caller-facing facade and the two background
/// threads. The queue and the registry are the only mutable pieces; both
/// carry their own lock.
pub(super) struct Shared<B: ScanBackend> {
    pub config: OrchestratorConfig,
    pub backend: B,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub sink: Arc<dyn ResultSink>,
    pub callback: CompletionCallback<B::Task>,
    pub queue: TaskQueue<B::Task>,
    pub registry: Registry<B::Task>,
    /// True from construction until shutdown begins.
    pub running: AtomicBool,
    /// True while the launcher thread may still insert into the registry;
    /// keeps the poller from exiting between queue drain and registration.
    pub launcher_active: AtomicBool,
}

/// The scan-task orchestration engine.
///
/// One instance owns a launcher thread (queue → containers) and a poller
/// thread (containers → results → completion callback), parameterized by a
/// [`ScanBackend`] that supplies the per-tool command line and bindings.
///
/// `enqueue` never blocks on a scan; the callback fires at most once per
/// task label, after the task's results are persisted.
pub struct Orchestrator<B: ScanBackend> {
    shared: Arc<Shared<B>>,
    launcher: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl<B: ScanBackend> Orchestrator<B> {
    /// Validate the config, probe the runtime, run the backend's prepare
    /// step, and start the background threads. Every failure here is
    /// returned synchronously; nothing is ever reported through the
    /// callback for a constructor that did not succeed.
    pub fn new(
        config: OrchestratorConfig,
        backend: B,
        runtime: Arc<dyn ContainerRuntime>,
        sink: Arc<dyn ResultSink>,
        callback: CompletionCallback<B::Task>,
    ) -> Result<Self> {
        config.validate()?;
        runtime.ping().context("container runtime unreachable")?;
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("creating output directory {}", config.output_dir.display())
        })?;
        backend
            .prepare(runtime.as_ref(), &config)
            .context("backend preparation failed")?;

        let shared = Arc::new(Shared {
            config,
            backend,
            runtime,
            sink,
            callback,
            queue: TaskQueue::new(),
            registry: Registry::new(),
            running: AtomicBool::new(true),
            launcher_active: AtomicBool::new(true),
        });

        let launcher = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name(format!("{}:launcher", shared.config.name))
                .spawn(move || launcher::run(shared))
                .context("failed to spawn launcher thread")?
        };
        let poller = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name(format!("{}:poller", shared.config.name))
                .spawn(move || poller::run(shared))
                .context("failed to spawn poller thread")?
        };

        info!(name = %shared.config.name, "orchestrator started");
        Ok(Self {
            shared,
            launcher: Some(launcher),
            poller: Some(poller),
        })
    }

    /// Construct against the docker CLI, honoring `config.docker_host`.
    pub fn with_docker(
        config: OrchestratorConfig,
        backend: B,
        sink: Arc<dyn ResultSink>,
        callback: CompletionCallback<B::Task>,
    ) -> Result<Self> {
        let runtime: Arc<dyn ContainerRuntime> = match &config.docker_host {
            Some(host) => Arc::new(CliRuntime::with_host(host.clone())),
            None => Arc::new(CliRuntime::new()),
        };
        Self::new(config, backend, runtime, sink, callback)
    }

    /// Hand a task to the launcher. Non-blocking: returns before the
    /// container exists. Calling this after `shutdown` has begun is a
    /// programming error and panics.
    pub fn enqueue(&self, task: B::Task) {
        assert!(
            self.shared.running.load(Ordering::Acquire),
            "enqueue on a stopped orchestrator"
        );
        self.shared.queue.push(Arc::new(task));
    }

    /// Tear the orchestrator down. Idempotent; the second call is a no-op.
    ///
    /// Both modes first flush containers that already reached a terminal
    /// state through the normal completion path, so finished results are
    /// not lost. With `wait = true` the call then blocks until the queue is
    /// drained, every launched container has completed and been reported,
    /// and both threads have exited. With `wait = false` still-queued tasks
    /// are dropped and still-running containers are force-removed; those
    /// tasks never receive a callback.
    pub fn shutdown(&mut self, wait: bool) {
        if self.launcher.is_none() && self.poller.is_none() {
            return;
        }
        info!(name = %self.shared.config.name, wait, "orchestrator shutting down");
        self.shared.running.store(false, Ordering::Release);

        // Flush whatever already finished, even when the caller won't wait.
        poller::sweep(&self.shared);

        if wait {
            self.shared.queue.close();
        } else {
            let dropped = self.shared.queue.close_abandoning();
            if dropped > 0 {
                warn!(dropped, "dropping queued tasks");
            }
            self.force_remove_remaining();
        }

        if let Some(handle) = self.launcher.take() {
            let _ = handle.join();
        }
        if !wait {
            // The launcher may have registered a container between the first
            // removal pass and its exit; clear any such straggler now that it
            // is joined, or the poller would keep sweeping it.
            self.force_remove_remaining();
        }
        if let Some(handle) = self.poller.take() {
            let _ = handle.join();
        }
        info!(name = %self.shared.config.name, "orchestrator shut down");
    }

    /// Abandon every registered container: remove it by force, fire no
    /// callback. Takes the same registry lock the poller sweeps under.
    fn force_remove_remaining(&self) {
        for entry in self.shared.registry.drain() {
            warn!(label = entry.task.label(), "force-removing container");
            if let Err(e) = self.shared.runtime.remove(&entry.handle, true) {
                warn!(label = entry.task.label(), error = %e, "force removal failed");
            }
        }
    }
}

impl<B: ScanBackend> Drop for Orchestrator<B> {
    /// Dropping without an explicit shutdown abandons in-flight work, the
    /// same as `shutdown(false)`.
    fn drop(&mut self) {
        self.shutdown(false);
    }
}
