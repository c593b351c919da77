use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::InvokeError;

/// Result envelope the bridge process prints on stdout.
///
/// Decoded explicitly: anything that matches neither arm is a parse error,
/// never silently treated as data. The shipped Python bridge reports
/// `status: "success"`, accepted here as an alias for `ok`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    #[serde(alias = "success")]
    Ok { data: Value },
    Error {
        message: String,
        #[serde(default)]
        traceback: Option<String>,
    },
}

/// Seam between the dispatcher and whatever runs the analytics bridge.
///
/// The production implementation spawns one external process per call;
/// a pooled or in-process implementation can swap in without touching
/// the dispatcher.
#[async_trait]
pub trait BridgeInvoker: Send + Sync {
    async fn invoke(&self, function: &str, args: &[String]) -> Result<Envelope, InvokeError>;
}
