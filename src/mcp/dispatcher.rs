//! Tool registry and dispatcher
//!
//! The registry is filled once at startup and then frozen into a
//! [`Dispatcher`], which owns the manifest and routes calls by tool name.
//! A failing or panicking handler is contained here: it is reported to the
//! telemetry sink and turned into a [`DispatchError`], never propagated as a
//! crash.

use super::tool::{ToolDescriptor, ToolHandler, ToolResponse};
use crate::error::DispatchError;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity reported by `initialize` and the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "telescope-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Recorded application debugging entries".to_string(),
        }
    }
}

/// Discovery document listing every tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; a later registration under the same name replaces the earlier one
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        let name = tool.descriptor().name.clone();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "Replaced previously registered tool");
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Handler returned normal content
    Success,
    /// Handler returned an error-typed content block
    ErrorContent,
    /// Handler returned `Err`
    Failed,
    Panicked,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ErrorContent => "error_content",
            Self::Failed => "failed",
            Self::Panicked => "panicked",
        }
    }
}

/// One finished tool call, as seen by telemetry
#[derive(Debug)]
pub struct CallEvent<'a> {
    pub tool: &'a str,
    pub arguments: &'a Map<String, Value>,
    pub outcome: CallOutcome,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Sink for per-call telemetry
pub trait ToolTelemetry: Send + Sync {
    fn record(&self, event: &CallEvent<'_>);
}

/// Default telemetry: a structured tracing event plus Prometheus metrics
pub struct TracingTelemetry;

impl ToolTelemetry for TracingTelemetry {
    fn record(&self, event: &CallEvent<'_>) {
        let duration_ms = event.duration.as_millis() as u64;

        match event.outcome {
            CallOutcome::Success | CallOutcome::ErrorContent => {
                tracing::info!(
                    tool = event.tool,
                    outcome = event.outcome.as_str(),
                    duration_ms,
                    "Tool call completed"
                );
            }
            CallOutcome::Failed | CallOutcome::Panicked => {
                let arguments = serde_json::Value::Object(event.arguments.clone());
                tracing::error!(
                    tool = event.tool,
                    outcome = event.outcome.as_str(),
                    arguments = %arguments,
                    error = event.error.as_deref().unwrap_or(""),
                    duration_ms,
                    "Tool call failed"
                );
            }
        }

        crate::metrics::record_tool_call(event.tool, event.outcome.as_str(), event.duration);
    }
}

pub struct Dispatcher {
    info: ServerInfo,
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
    manifest: Manifest,
    telemetry: Arc<dyn ToolTelemetry>,
}

impl Dispatcher {
    pub fn new(info: ServerInfo, registry: ToolRegistry, telemetry: Arc<dyn ToolTelemetry>) -> Self {
        let manifest = Manifest {
            name: info.name.clone(),
            version: info.version.clone(),
            description: info.description.clone(),
            tools: registry
                .tools
                .values()
                .map(|tool| tool.descriptor().clone())
                .collect(),
        };

        tracing::debug!(tools = registry.tools.len(), "Tool dispatcher ready");

        Self {
            info,
            tools: registry.tools,
            manifest,
            telemetry,
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Call a tool by name
    pub async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResponse, DispatchError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| DispatchError::ToolNotFound(name.to_string()))?;

        let start = Instant::now();
        let result = AssertUnwindSafe(tool.call(arguments)).catch_unwind().await;
        let duration = start.elapsed();

        let (outcome, error, result) = match result {
            Ok(Ok(output)) => {
                let response = ToolResponse::from(output);
                let outcome = if response.is_error {
                    CallOutcome::ErrorContent
                } else {
                    CallOutcome::Success
                };
                (outcome, None, Ok(response))
            }
            Ok(Err(source)) => (
                CallOutcome::Failed,
                Some(source.to_string()),
                Err(DispatchError::ToolFailed {
                    tool: name.to_string(),
                    source,
                }),
            ),
            Err(_) => (
                CallOutcome::Panicked,
                Some("handler panicked".to_string()),
                Err(DispatchError::Panicked(name.to_string())),
            ),
        };

        self.telemetry.record(&CallEvent {
            tool: name,
            arguments,
            outcome,
            duration,
            error,
        });

        result
    }
}
