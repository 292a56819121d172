//! JSON-RPC 2.0 envelope for the tool protocol
//!
//! [`McpService`] maps one incoming message to at most one response. It is
//! transport-agnostic: the HTTP and stdio front doors both feed it raw JSON.

use super::dispatcher::Dispatcher;
use super::tool::ToolResponse;
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
pub struct McpService {
    dispatcher: Arc<Dispatcher>,
}

impl McpService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handle one raw message; `None` means nothing should be sent back
    pub async fn handle_raw(&self, raw: &str) -> Option<RpcResponse> {
        match serde_json::from_str::<Value>(raw) {
            Ok(message) => self.handle_value(message).await,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable JSON-RPC message");
                Some(RpcResponse::failure(
                    Value::Null,
                    RpcError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
                ))
            }
        }
    }

    pub async fn handle_value(&self, message: Value) -> Option<RpcResponse> {
        let Value::Object(mut message) = message else {
            return Some(invalid_request(Value::Null, "Request must be a JSON object"));
        };

        // Requests without an id are notifications and never get a reply
        let id = message.remove("id");
        let is_notification = id.is_none();
        let id = id.unwrap_or(Value::Null);

        if message.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return (!is_notification).then(|| invalid_request(id, "jsonrpc must be \"2.0\""));
        }

        let Some(method) = message.get("method").and_then(Value::as_str).map(str::to_string) else {
            return (!is_notification).then(|| invalid_request(id, "Missing method"));
        };

        crate::metrics::record_rpc_request(method_label(&method));

        if is_notification {
            tracing::debug!(method = %method, "Received notification");
            return None;
        }

        let params = message.remove("params").unwrap_or(Value::Null);

        let outcome = match method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.dispatcher.manifest().tools })),
            "manifest" => serde_json::to_value(self.dispatcher.manifest())
                .map_err(|e| RpcError::new(ErrorCode::InternalError, e.to_string())),
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::new(
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", other),
            )),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        })
    }

    fn initialize_result(&self) -> Value {
        let info = self.dispatcher.info();
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": info.name,
                "version": info.version,
            },
            "instructions": info.description,
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let Value::Object(params) = params else {
            return Err(RpcError::new(ErrorCode::InvalidParams, "params must be an object"));
        };

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new(ErrorCode::InvalidParams, "Missing tool name"))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(args)) => args.clone(),
            Some(_) => {
                return Err(RpcError::new(
                    ErrorCode::InvalidParams,
                    "arguments must be an object",
                ))
            }
        };

        let response = match self.dispatcher.invoke(name, &arguments).await {
            Ok(response) => response,
            Err(DispatchError::ToolNotFound(name)) => {
                return Err(RpcError::new(
                    ErrorCode::InvalidParams,
                    format!("Unknown tool: {}", name),
                ))
            }
            Err(DispatchError::ToolFailed { source, .. }) => ToolResponse::error(source.to_string()),
            Err(e @ DispatchError::Panicked(_)) => {
                return Err(RpcError::new(ErrorCode::InternalError, e.to_string()))
            }
        };

        serde_json::to_value(response).map_err(|e| RpcError::new(ErrorCode::InternalError, e.to_string()))
    }
}

/// Metric label for a method name; anything unrecognised shares one label
fn method_label(method: &str) -> &'static str {
    match method {
        "initialize" => "initialize",
        "ping" => "ping",
        "tools/list" => "tools/list",
        "tools/call" => "tools/call",
        "manifest" => "manifest",
        m if m.starts_with("notifications/") => "notifications",
        _ => "unknown",
    }
}

fn invalid_request(id: Value, message: &str) -> RpcResponse {
    RpcResponse::failure(id, RpcError::new(ErrorCode::InvalidRequest, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::dispatcher::tests::{RecordingTelemetry, StubTool};
    use crate::mcp::dispatcher::{ServerInfo, ToolRegistry};

    fn service() -> McpService {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StubTool::new("echo", "echo")));
        registry.register(Arc::new(StubTool::new("broken", "fail")));
        registry.register(Arc::new(StubTool::new("boom", "panic")));

        let dispatcher = Dispatcher::new(
            ServerInfo::default(),
            registry,
            Arc::new(RecordingTelemetry::default()),
        );
        McpService::new(Arc::new(dispatcher))
    }

    async fn call(service: &McpService, message: Value) -> RpcResponse {
        service.handle_value(message).await.unwrap()
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = service().handle_raw("{not json").await.unwrap();

        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let service = service();

        let response = call(&service, json!([1, 2])).await;
        assert_eq!(response.error.unwrap().code, -32600);

        let response = call(&service, json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).await;
        assert_eq!(response.error.unwrap().code, -32600);

        let response = call(&service, json!({"jsonrpc": "2.0", "id": 1})).await;
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_initialize_and_ping() {
        let service = service();

        let response = call(&service, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "telescope-mcp");

        let response = call(&service, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(response.id, json!("p"));
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let response = service()
            .handle_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_and_manifest() {
        let service = service();

        let response = call(&service, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 3);
        assert!(tools[0]["inputSchema"].is_object());

        let response = call(&service, json!({"jsonrpc": "2.0", "id": 3, "method": "manifest"})).await;
        assert_eq!(response.result.unwrap()["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let response = call(&service(), json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"})).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_call() {
        let service = service();

        let response = call(
            &service,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                   "params": {"name": "echo", "arguments": {"limit": 3}}}),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], r#"{"limit":3}"#);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let service = service();

        let unknown = call(
            &service,
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "bogus"}}),
        )
        .await;
        assert_eq!(unknown.error.unwrap().code, -32602);

        let missing = call(&service, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {}})).await;
        assert_eq!(missing.error.unwrap().code, -32602);

        let bad_args = call(
            &service,
            json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call",
                   "params": {"name": "echo", "arguments": [1]}}),
        )
        .await;
        assert_eq!(bad_args.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tools_call_failures() {
        let service = service();

        let failed = call(
            &service,
            json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": {"name": "broken"}}),
        )
        .await;
        let result = failed.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["type"], "error");

        let panicked = call(
            &service,
            json!({"jsonrpc": "2.0", "id": 10, "method": "tools/call", "params": {"name": "boom"}}),
        )
        .await;
        assert_eq!(panicked.error.unwrap().code, -32603);
    }

    #[test]
    fn test_method_label() {
        assert_eq!(method_label("tools/call"), "tools/call");
        assert_eq!(method_label("notifications/initialized"), "notifications");
        assert_eq!(method_label("junk/42"), "unknown");
    }

    #[test]
    fn test_rpc_metric_labels_stay_bounded() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let service = service();
                for i in 0..500 {
                    let response = service
                        .handle_value(json!({"jsonrpc": "2.0", "id": i, "method": format!("junk/{}", i)}))
                        .await
                        .unwrap();
                    assert_eq!(response.error.unwrap().code, -32601);
                }
                service
                    .handle_value(json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}))
                    .await
                    .unwrap();
            });
        });

        let rendered = handle.render();
        let series = rendered
            .lines()
            .filter(|line| line.starts_with("telescope_mcp_rpc_requests_total{"))
            .count();
        assert_eq!(series, 2);
        assert!(rendered.contains(r#"method="unknown""#));
    }
}
