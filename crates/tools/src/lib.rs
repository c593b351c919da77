pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod invoker;
pub mod registry;

pub use catalog::{ParamKind, ParamSpec, ToolSpec, CATALOG};
pub use dispatcher::ToolDispatcher;
pub use error::{InvokeError, ToolError};
pub use invoker::{BridgeInvoker, Envelope};
pub use registry::ToolRegistry;
