//! Engine configuration.
//!
//! The configuration is resolved once at startup (JSON file, then CLI
//! overrides) and handed to the engine by reference; steps never read
//! environment or global state themselves.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings that shape the generated commands and where they land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Root directory; each operator gets `<output_root>/<operator>`
    pub output_root: PathBuf,
    /// AWS CLI named profile added to every `aws` command
    pub aws_profile: Option<String>,
    /// kubectl context name, `{region}` and `{cluster}` are substituted
    pub kube_context_template: String,
    /// Add `--apply-immediately` to RDS modifications
    pub apply_immediately: bool,
    /// Directory (relative to where the operator runs the script) for table dumps
    pub dump_dir: String,
    /// Timeout passed to `kubectl rollout status`
    pub rollout_timeout_secs: u32,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("dist"),
            aws_profile: None,
            kube_context_template: "{cluster}".to_string(),
            apply_immediately: true,
            dump_dir: "dumps".to_string(),
            rollout_timeout_secs: 300,
        }
    }
}

impl MaintenanceConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_root.as_os_str().is_empty() {
            anyhow::bail!("Output root must not be empty");
        }

        if !self.kube_context_template.contains("{cluster}") {
            anyhow::bail!("Kube context template must contain {{cluster}}");
        }

        if let Some(profile) = &self.aws_profile {
            if profile.trim().is_empty() || profile.contains(char::is_whitespace) {
                anyhow::bail!("AWS profile must be a single non-empty word");
            }
        }

        if self.dump_dir.trim().is_empty() {
            anyhow::bail!("Dump directory must not be empty");
        }

        if self.rollout_timeout_secs == 0 {
            anyhow::bail!("Rollout timeout must be greater than zero");
        }

        Ok(())
    }

    /// kubectl context for a cluster in a region.
    pub fn kube_context(&self, region: &str, cluster: &str) -> String {
        self.kube_context_template
            .replace("{region}", region)
            .replace("{cluster}", cluster)
    }
}
