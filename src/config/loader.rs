use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::types::OrchestratorConfig;

/// On-disk overrides for an [`OrchestratorConfig`]. Every field is optional;
/// unset fields leave the base config untouched.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigOverrides {
    pub image: Option<String>,
    pub poll_interval_secs: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub docker_host: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub run_as_invoking_user: Option<bool>,
}

impl ConfigOverrides {
    /// Load overrides from a `.scandock.yaml` file in the given directory.
    pub fn load(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(".scandock.yaml");
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let overrides: ConfigOverrides = serde_yaml::from_str(&contents)?;
        Ok(Some(overrides))
    }

    /// Overlay these overrides onto a base config.
    pub fn apply(self, config: &mut OrchestratorConfig) {
        if let Some(image) = self.image {
            config.image = image;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(host) = self.docker_host {
            config.docker_host = Some(host);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(run_as_user) = self.run_as_invoking_user {
            config.run_as_invoking_user = run_as_user;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = ConfigOverrides::load(dir.path()).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".scandock.yaml"), "image: [not, a, string").unwrap();
        assert!(ConfigOverrides::load(dir.path()).is_err());
    }

    #[test]
    fn partial_overrides_only_touch_set_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(".scandock.yaml"),
            "image: alpine:3.20\npoll_interval_secs: 1.5\n",
        )
        .unwrap();

        let overrides = ConfigOverrides::load(dir.path())
            .expect("load")
            .expect("file present");

        let mut cfg = OrchestratorConfig::new("scout", "rossja/ncc-scoutsuite:aws-latest", "/out");
        overrides.apply(&mut cfg);

        assert_eq!(cfg.image, "alpine:3.20");
        assert_eq!(cfg.poll_interval, Duration::from_secs_f64(1.5));
        // Untouched fields keep their defaults.
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert!(cfg.docker_host.is_none());
    }
}
