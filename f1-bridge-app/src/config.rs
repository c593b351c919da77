use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter used to run the bridge script.
    pub python_bin: String,
    /// Path to the analytics bridge script.
    pub script: PathBuf,
    /// Per-call wall-clock limit in seconds; 0 disables the limit.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            script: PathBuf::from("./bridge/f1_bridge.py"),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when the file does
    /// not exist. Environment variables override either source.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bin) = std::env::var("F1_BRIDGE_PYTHON") {
            self.python_bin = bin;
        }
        if let Ok(script) = std::env::var("F1_BRIDGE_SCRIPT") {
            self.script = PathBuf::from(script);
        }
        if let Ok(raw) = std::env::var("F1_BRIDGE_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("Ignoring non-numeric F1_BRIDGE_TIMEOUT_SECS: {raw}"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.python_bin.trim().is_empty() {
            anyhow::bail!("python_bin must not be empty");
        }
        if self.script.as_os_str().is_empty() {
            anyhow::bail!("script must not be empty");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
