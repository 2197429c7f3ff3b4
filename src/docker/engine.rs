use std::time::Duration;

use super::error::RuntimeError;
use super::types::{ContainerHandle, ContainerStatus, LogStream, RunSpec};

/// Interface the orchestrator consumes from a container runtime.
///
/// Object-safe so tests can substitute a scripted implementation for the
/// docker CLI. All calls are synchronous; the caller decides which thread
/// they run on.
pub trait ContainerRuntime: Send + Sync {
    /// Probe the runtime. An error here is an initialization fault.
    fn ping(&self) -> Result<(), RuntimeError>;

    /// Create and start a detached container. Returns as soon as the runtime
    /// accepts the container; nobody waits for exit here.
    fn create_and_start(&self, spec: &RunSpec) -> Result<ContainerHandle, RuntimeError>;

    /// Refresh a container's reported state and labels.
    fn inspect(&self, handle: &ContainerHandle) -> Result<ContainerStatus, RuntimeError>;

    /// Fetch one output stream of a container.
    fn logs(&self, handle: &ContainerHandle, stream: LogStream) -> Result<Vec<u8>, RuntimeError>;

    /// Block until the container exits and return its exit status code.
    fn wait(&self, handle: &ContainerHandle, timeout: Duration) -> Result<i64, RuntimeError>;

    /// Remove a container, killing it first when `force` is set.
    fn remove(&self, handle: &ContainerHandle, force: bool) -> Result<(), RuntimeError>;
}

/// Returns `uid:gid` of the invoking user on Unix so containers write
/// mounted output as that user rather than root. `None` elsewhere.
pub fn invoking_user() -> Option<String> {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() and getegid() are simple POSIX getters that always succeed and have no side effects.
        let uid = unsafe { libc::geteuid() };
        let gid = unsafe { libc::getegid() };
        Some(format!("{uid}:{gid}"))
    }

    #[cfg(not(unix))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn invoking_user_is_a_uid_gid_pair() {
        let user = invoking_user().expect("unix always has a uid");
        assert!(user.contains(':'));
    }
}
