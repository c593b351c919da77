use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument '{param}' for {tool}")]
    MissingArgument {
        tool: &'static str,
        param: &'static str,
    },

    #[error("Invalid argument '{param}': {reason}")]
    InvalidArgument {
        param: &'static str,
        reason: String,
    },

    /// The bridge process ran to completion but reported a failure envelope.
    #[error("{message}")]
    Upstream {
        message: String,
        traceback: Option<String>,
    },

    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Failed to start bridge process: {0}")]
    Spawn(String),

    #[error("Bridge process failed ({status}): {stderr}")]
    ProcessFailed {
        status: ExitStatus,
        stderr: String,
    },

    #[error("Bridge output is not a valid result envelope: {error}")]
    MalformedOutput { error: String, raw: String },

    #[error("Bridge call timed out after {0:?}")]
    Timeout(Duration),
}
