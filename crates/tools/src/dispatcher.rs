use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ToolError;
use crate::invoker::{BridgeInvoker, Envelope};
use crate::registry::ToolRegistry;

pub struct ToolDispatcher {
    registry: ToolRegistry,
    invoker: Arc<dyn BridgeInvoker>,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry, invoker: Arc<dyn BridgeInvoker>) -> Self {
        Self { registry, invoker }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool call to completion.
    ///
    /// Returns the bridge data pretty-printed as JSON text. Every failure
    /// mode is a typed error; nothing here may take the server down.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let argv = spec.marshal_args(arguments)?;
        info!("Dispatching {} with {} argument(s)", spec.name, argv.len());

        match self.invoker.invoke(spec.name, &argv).await? {
            Envelope::Ok { data } => {
                Ok(serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()))
            }
            Envelope::Error { message, traceback } => {
                warn!("Bridge reported failure for {}: {}", spec.name, message);
                Err(ToolError::Upstream { message, traceback })
            }
        }
    }
}
