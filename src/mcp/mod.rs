//! Tool-invocation protocol: handler contract, dispatcher and JSON-RPC envelope

pub mod dispatcher;
pub mod protocol;
pub mod tool;

pub use dispatcher::{
    CallEvent, CallOutcome, Dispatcher, Manifest, ServerInfo, ToolRegistry, ToolTelemetry,
    TracingTelemetry,
};
pub use protocol::{ErrorCode, McpService, RpcError, RpcResponse};
pub use tool::{BlockKind, ContentBlock, ToolDescriptor, ToolHandler, ToolOutput, ToolResponse};
