use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::backend::ScanBackend;
use crate::docker::{ContainerHandle, LogStream, RuntimeError};
use crate::orchestrator::Task;
use crate::sink::TaskRecord;

use super::engine::Shared;
use super::registry::RegistryEntry;

/// Poller thread body: sweep the registry on a fixed interval until the
/// orchestrator stops and all known work is flushed. The launcher keeps the
/// poller alive even after `running` flips, so containers launched during a
/// graceful drain are still observed.
pub(super) fn run<B: ScanBackend>(shared: Arc<Shared<B>>) {
    while shared.running.load(Ordering::Acquire)
        || shared.launcher_active.load(Ordering::Acquire)
        || !shared.registry.is_empty()
    {
        sweep(&shared);
        std::thread::sleep(shared.config.poll_interval);
    }
    info!("poller exiting");
}

/// One pass over the registry: finish every terminal container, leave the
/// rest for the next interval. Also called synchronously by `shutdown` to
/// flush already-finished containers. The registry lock is held across the
/// whole inspection pass; container disposal happens after it is released.
pub(super) fn sweep<B: ScanBackend>(shared: &Shared<B>) {
    let mut disposals: Vec<(String, ContainerHandle)> = Vec::new();
    {
        let mut entries = shared.registry.lock();
        let mut completed: Vec<String> = Vec::new();

        for (label, entry) in entries.iter() {
            let status = match shared.runtime.inspect(&entry.handle) {
                Ok(status) => status,
                Err(e) if e.is_fatal() => {
                    panic!("container runtime protocol violation: {e}");
                }
                Err(e) => {
                    // Transient: this entry is retried next sweep, the rest
                    // of the sweep continues.
                    warn!(label = %label, error = %e, "inspect failed, will retry");
                    continue;
                }
            };

            if !status.state.is_terminal() {
                continue;
            }

            // The container must prove it belongs to this task.
            let tagged = status
                .labels
                .get(&shared.config.task_label_key())
                .map(String::as_str);
            assert_eq!(
                tagged,
                Some(entry.task.label()),
                "container {} is not labeled for task {}",
                entry.handle,
                entry.task.label(),
            );

            match finish(shared, entry) {
                Ok(status_code) => {
                    info!(label = %label, status = status_code, "scan task completed");
                    (shared.callback)(entry.task.as_ref(), true);
                    completed.push(label.clone());
                }
                Err(e) => {
                    warn!(label = %label, error = %e, "result retrieval failed, will retry");
                }
            }
        }

        for label in completed {
            if let Some(entry) = entries.remove(&label) {
                disposals.push((label, entry.handle));
            }
        }

        debug!(in_flight = entries.len(), "sweep complete");
    }

    for (label, handle) in disposals {
        if let Err(e) = shared.runtime.remove(&handle, false) {
            warn!(label = %label, error = %e, "container disposal failed");
        }
    }
}

/// Pull exit status and output streams for a terminal container and hand the
/// record to the sink. Any retrieval error leaves the entry registered for
/// the next sweep.
fn finish<B: ScanBackend>(
    shared: &Shared<B>,
    entry: &RegistryEntry<B::Task>,
) -> Result<i64, RuntimeError> {
    let status_code = shared.runtime.wait(&entry.handle, shared.config.timeout)?;
    let stdout = shared.runtime.logs(&entry.handle, LogStream::Stdout)?;
    let stderr = shared.runtime.logs(&entry.handle, LogStream::Stderr)?;

    let record = TaskRecord {
        label: entry.task.label().to_string(),
        status_code,
        finished_at: SystemTime::now(),
        stdout,
        stderr,
    };

    // Results are persisted before the callback fires. A sink failure is
    // logged but does not retract the completion: the container's lifecycle
    // is finished and retrieval succeeded.
    if let Err(e) = shared.sink.persist(&record) {
        tracing::error!(label = %record.label, error = %e, "failed to persist scan results");
    }

    Ok(status_code)
}
