use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use f1_bridge_tools::{BridgeInvoker, Envelope, InvokeError};

/// Runs the Python analytics bridge, one process per call.
///
/// No pooling and no reuse: each invocation is an independent child process
/// and may run concurrently with any number of others. `kill_on_drop`
/// ensures a child left behind by a timed-out or abandoned call does not
/// outlive it.
pub struct PythonBridge {
    python_bin: PathBuf,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl PythonBridge {
    pub fn new(python_bin: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            python_bin: python_bin.into(),
            script: script.into(),
            timeout: None,
        }
    }

    /// Per-call wall-clock limit. `None` lets a call run indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, function: &str, args: &[String]) -> Result<Envelope, InvokeError> {
        let output = Command::new(&self.python_bin)
            .arg(&self.script)
            .arg(function)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| InvokeError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Bridge process failed ({}): {}", output.status, stderr);
            return Err(InvokeError::ProcessFailed {
                status: output.status,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim()).map_err(|e| InvokeError::MalformedOutput {
            error: e.to_string(),
            raw: stdout.into_owned(),
        })
    }
}

#[async_trait]
impl BridgeInvoker for PythonBridge {
    async fn invoke(&self, function: &str, args: &[String]) -> Result<Envelope, InvokeError> {
        debug!("Spawning {} for {}", self.script.display(), function);
        match self.timeout {
            Some(limit) => timeout(limit, self.run(function, args))
                .await
                .map_err(|_| InvokeError::Timeout(limit))?,
            None => self.run(function, args).await,
        }
    }
}
