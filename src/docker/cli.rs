use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use super::engine::ContainerRuntime;
use super::error::RuntimeError;
use super::types::{ContainerHandle, ContainerStatus, LogStream, RunSpec};

/// How often to check whether a bounded `docker wait` has finished.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Production runtime backed by the `docker` CLI.
///
/// Every trait call shells out to `docker`; there is no persistent daemon
/// connection to manage or lose.
pub struct CliRuntime {
    /// Passed as `-H` when set; otherwise the CLI's default endpoint is used.
    host: Option<String>,
}

impl CliRuntime {
    pub fn new() -> Self {
        Self { host: None }
    }

    /// Talk to an explicit docker endpoint, e.g. `unix:///run/user/1000/docker.sock`.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
        }
    }

    fn base(&self) -> Command {
        let mut cmd = Command::new("docker");
        if let Some(host) = &self.host {
            cmd.arg("-H").arg(host);
        }
        cmd
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for CliRuntime {
    fn ping(&self) -> Result<(), RuntimeError> {
        let status = self
            .base()
            .args(["version", "--format", "{{.Server.Version}}"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                RuntimeError::Unavailable(format!(
                    "failed to invoke `docker` — is it installed and on PATH? ({e})"
                ))
            })?;

        if !status.success() {
            return Err(RuntimeError::Unavailable(format!(
                "docker daemon is not running (exit {status})"
            )));
        }
        Ok(())
    }

    fn create_and_start(&self, spec: &RunSpec) -> Result<ContainerHandle, RuntimeError> {
        let out = self.base().args(run_args(spec)).output()?;
        if !out.status.success() {
            return Err(RuntimeError::Rejected(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }

        // `docker run -d` prints the new container's id on stdout.
        let id = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if id.is_empty() {
            return Err(RuntimeError::Rejected(
                "docker run produced no container id".to_string(),
            ));
        }
        debug!(id = %id, image = %spec.image, "container started");
        Ok(ContainerHandle::new(id))
    }

    fn inspect(&self, handle: &ContainerHandle) -> Result<ContainerStatus, RuntimeError> {
        let out = self
            .base()
            .args([
                "inspect",
                "-f",
                "{{.State.Status}} {{json .Config.Labels}}",
                handle.id(),
            ])
            .output()?;
        if !out.status.success() {
            return Err(RuntimeError::NotFound(handle.id().to_string()));
        }

        let text = String::from_utf8_lossy(&out.stdout);
        let line = text.trim();
        let (state_str, labels_json) = line.split_once(' ').unwrap_or((line, "null"));

        let state = state_str.parse()?;
        let labels: HashMap<String, String> =
            serde_json::from_str::<Option<HashMap<String, String>>>(labels_json)
                .map_err(|e| RuntimeError::Io(format!("unparsable label block: {e}")))?
                .unwrap_or_default();

        Ok(ContainerStatus { state, labels })
    }

    fn logs(&self, handle: &ContainerHandle, stream: LogStream) -> Result<Vec<u8>, RuntimeError> {
        // `docker logs` replays container stdout on our stdout and container
        // stderr on our stderr; pick the requested side.
        let out = self.base().args(["logs", handle.id()]).output()?;
        if !out.status.success() {
            return Err(RuntimeError::NotFound(handle.id().to_string()));
        }
        Ok(match stream {
            LogStream::Stdout => out.stdout,
            LogStream::Stderr => out.stderr,
        })
    }

    fn wait(&self, handle: &ContainerHandle, timeout: Duration) -> Result<i64, RuntimeError> {
        // `docker wait` blocks until the container exits and prints its exit
        // status. Bound it with a deadline; past the deadline the CLI call is
        // killed and the caller retries on a later sweep.
        let mut child = self
            .base()
            .args(["wait", handle.id()])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        return Err(RuntimeError::NotFound(handle.id().to_string()));
                    }
                    let mut buf = String::new();
                    if let Some(mut stdout) = child.stdout.take() {
                        stdout.read_to_string(&mut buf)?;
                    }
                    return buf.trim().parse::<i64>().map_err(|_| {
                        RuntimeError::Io(format!("unparsable exit status {:?}", buf.trim()))
                    });
                }
                Ok(None) => {}
                Err(e) => return Err(e.into()),
            }

            if start.elapsed() > timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RuntimeError::Timeout(timeout));
            }

            std::thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    fn remove(&self, handle: &ContainerHandle, force: bool) -> Result<(), RuntimeError> {
        let mut cmd = self.base();
        cmd.arg("rm");
        if force {
            cmd.arg("-f");
        }
        cmd.arg(handle.id());

        let out = cmd.output()?;
        if !out.status.success() {
            return Err(RuntimeError::NotFound(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        debug!(id = %handle, force, "container removed");
        Ok(())
    }
}

/// Argument list for `docker <args>` that creates and starts one detached
/// container from a [`RunSpec`].
fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string()];
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    for mount in &spec.volumes {
        args.push("-v".into());
        args.push(mount.to_arg());
    }
    for (key, value) in &spec.env {
        args.push("-e".into());
        args.push(format!("{key}={value}"));
    }
    if let Some(dir) = &spec.working_dir {
        args.push("-w".into());
        args.push(dir.clone());
    }
    if let Some(user) = &spec.user {
        args.push("--user".into());
        args.push(user.clone());
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::Mount;

    fn test_spec() -> RunSpec {
        RunSpec {
            image: "projectdiscovery/nuclei:v2.9.6".into(),
            command: vec!["-target".into(), "example.org".into()],
            labels: vec![("scan-task-id".into(), "t1".into())],
            volumes: vec![Mount::read_write("/tmp/out", "/root/output")],
            env: vec![("API_KEY".into(), "secret".into())],
            working_dir: Some("/root".into()),
            user: None,
        }
    }

    #[test]
    fn run_args_starts_detached() {
        let args = run_args(&test_spec());
        assert_eq!(args[0], "run");
        assert_eq!(args[1], "-d");
    }

    #[test]
    fn run_args_carries_labels_volumes_env() {
        let args = run_args(&test_spec());
        assert!(args.contains(&"--label".to_string()));
        assert!(args.contains(&"scan-task-id=t1".to_string()));
        assert!(args.contains(&"/tmp/out:/root/output".to_string()));
        assert!(args.contains(&"API_KEY=secret".to_string()));
        assert!(args.contains(&"/root".to_string()));
    }

    #[test]
    fn run_args_image_precedes_command() {
        let args = run_args(&test_spec());
        let image_at = args
            .iter()
            .position(|a| a == "projectdiscovery/nuclei:v2.9.6")
            .expect("image present");
        let target_at = args.iter().position(|a| a == "-target").expect("command present");
        assert!(image_at < target_at);
    }

    #[test]
    fn run_args_omits_unset_options() {
        let spec = RunSpec {
            image: "alpine".into(),
            command: vec!["true".into()],
            ..RunSpec::default()
        };
        let args = run_args(&spec);
        assert!(!args.contains(&"-w".to_string()));
        assert!(!args.contains(&"--user".to_string()));
        assert!(!args.contains(&"-e".to_string()));
    }

    #[test]
    fn run_args_sets_user_when_requested() {
        let mut spec = test_spec();
        spec.user = Some("1000:1000".into());
        let args = run_args(&spec);
        assert!(args.contains(&"--user".to_string()));
        assert!(args.contains(&"1000:1000".to_string()));
    }
}
