use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::docker::Mount;

/// Static parameters governing one orchestrator instance. Supplied once at
/// construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Instance name. Used for thread names, log context, and the container
    /// label key that ties containers back to their tasks.
    pub name: String,
    /// Image every scan container is created from.
    pub image: String,
    /// Cadence of the lifecycle poller. Also bounds the latency between a
    /// container finishing and its completion callback firing.
    pub poll_interval: Duration,
    /// Bound on each individual runtime inspection/retrieval call. Not a
    /// limit on how long a scan container may run.
    pub timeout: Duration,
    /// Volumes mounted into every scan container (e.g. credential files).
    pub volumes: Vec<Mount>,
    /// Environment exported to every scan container.
    pub env: Vec<(String, String)>,
    /// Host directory receiving one result subdirectory per task label.
    pub output_dir: PathBuf,
    /// Docker endpoint override; `None` uses the CLI default.
    pub docker_host: Option<String>,
    /// Run containers as the invoking uid:gid instead of the image default,
    /// so files written into mounted volumes stay owned by the caller.
    pub run_as_invoking_user: bool,
}

impl OrchestratorConfig {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            poll_interval: Duration::from_secs(16),
            timeout: Duration::from_secs(5),
            volumes: Vec::new(),
            env: Vec::new(),
            output_dir: output_dir.into(),
            docker_host: None,
            run_as_invoking_user: false,
        }
    }

    /// Container label key identifying which task a container belongs to.
    pub fn task_label_key(&self) -> String {
        format!("{}-task-id", self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("orchestrator name must not be empty");
        }
        if self.image.is_empty() {
            bail!("container image must not be empty");
        }
        if self.poll_interval.is_zero() {
            bail!("poll interval must be positive");
        }
        if self.timeout.is_zero() {
            bail!("runtime timeout must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = OrchestratorConfig::new("nuclei", "projectdiscovery/nuclei:v2.9.6", "/tmp/out");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.poll_interval, Duration::from_secs(16));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn task_label_key_derives_from_name() {
        let cfg = OrchestratorConfig::new("scout", "rossja/ncc-scoutsuite:aws-latest", "/tmp/out");
        assert_eq!(cfg.task_label_key(), "scout-task-id");
    }

    #[test]
    fn empty_image_is_rejected() {
        let cfg = OrchestratorConfig::new("scout", "", "/tmp/out");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut cfg = OrchestratorConfig::new("scout", "alpine", "/tmp/out");
        cfg.poll_interval = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = OrchestratorConfig::new("scout", "alpine", "/tmp/out");
        cfg.timeout = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }
}
