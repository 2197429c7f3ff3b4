use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::RuntimeError;

/// Container states as reported by the runtime, taken verbatim from
/// `docker ps`. Any other string coming back from the runtime is a protocol
/// violation, surfaced as [`RuntimeError::UnexpectedState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Restarting,
    Running,
    Removing,
    Paused,
    Exited,
    Dead,
}

impl ContainerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Created => "created",
            ContainerState::Restarting => "restarting",
            ContainerState::Running => "running",
            ContainerState::Removing => "removing",
            ContainerState::Paused => "paused",
            ContainerState::Exited => "exited",
            ContainerState::Dead => "dead",
        }
    }

    /// A terminal container makes no further progress on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContainerState::Exited | ContainerState::Dead)
    }
}

impl FromStr for ContainerState {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ContainerState::Created),
            "restarting" => Ok(ContainerState::Restarting),
            "running" => Ok(ContainerState::Running),
            "removing" => Ok(ContainerState::Removing),
            "paused" => Ok(ContainerState::Paused),
            "exited" => Ok(ContainerState::Exited),
            "dead" => Ok(ContainerState::Dead),
            other => Err(RuntimeError::UnexpectedState(other.to_string())),
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime-assigned container identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A host path bound into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: String,
    pub read_only: bool,
}

impl Mount {
    pub fn read_only(host_path: impl AsRef<Path>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.as_ref().to_path_buf(),
            container_path: container_path.into(),
            read_only: true,
        }
    }

    pub fn read_write(host_path: impl AsRef<Path>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.as_ref().to_path_buf(),
            container_path: container_path.into(),
            read_only: false,
        }
    }

    /// `-v` argument form understood by the docker CLI.
    pub fn to_arg(&self) -> String {
        let mut arg = format!("{}:{}", self.host_path.display(), self.container_path);
        if self.read_only {
            arg.push_str(":ro");
        }
        arg
    }
}

/// Describes one detached container invocation. The launcher assembles this
/// from a backend's launch plan merged with the orchestrator's static
/// bindings.
#[derive(Debug, Clone, Default)]
pub struct RunSpec {
    pub image: String,
    pub command: Vec<String>,
    pub labels: Vec<(String, String)>,
    pub volumes: Vec<Mount>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<String>,
    /// `uid:gid` the container runs as; `None` keeps the image default.
    pub user: Option<String>,
}

/// Snapshot returned by [`super::ContainerRuntime::inspect`].
#[derive(Debug, Clone)]
pub struct ContainerStatus {
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
}

/// Which output stream to retrieve from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}
