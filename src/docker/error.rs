use std::time::Duration;

use thiserror::Error;

/// Failures at the container-runtime boundary.
///
/// `UnexpectedState` is a protocol violation and aborts the poller; every
/// other variant is either a launch rejection (reported through the
/// completion callback) or a transient condition retried on the next sweep.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),
    #[error("create/start rejected: {0}")]
    Rejected(String),
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("runtime call timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected container state {0:?}")]
    UnexpectedState(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        RuntimeError::Io(e.to_string())
    }
}

impl RuntimeError {
    /// Protocol violations must abort the poller instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::UnexpectedState(_))
    }
}
