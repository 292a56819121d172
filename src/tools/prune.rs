//! The one destructive tool: age-based deletion of entries

use super::args::ToolArgs;
use crate::error::ToolError;
use crate::mcp::{ToolDescriptor, ToolHandler, ToolOutput};
use crate::store::EntryStore;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const DEFAULT_PRUNE_HOURS: i64 = 24;

pub struct PruneTool {
    store: Arc<dyn EntryStore>,
    descriptor: ToolDescriptor,
}

impl PruneTool {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            descriptor: ToolDescriptor {
                name: "prune".to_string(),
                description: "Delete recorded entries older than the given number of hours".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "hours": {
                            "type": "integer",
                            "description": "Delete entries older than this many hours",
                            "default": DEFAULT_PRUNE_HOURS,
                            "minimum": 1,
                        }
                    }
                }),
            },
        }
    }
}

#[async_trait]
impl ToolHandler for PruneTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let hours = ToolArgs::new(arguments)
            .optional_i64("hours")?
            .unwrap_or(DEFAULT_PRUNE_HOURS);

        if hours < 1 {
            return Err(ToolError::invalid("hours", "must be at least 1"));
        }

        Ok(match self.store.prune(hours as u64).await {
            Ok(summary) => ToolOutput::Text(format!(
                "Pruned {} entries older than {} hours.",
                summary.entries_deleted, hours
            )),
            Err(e) => {
                tracing::error!(tool = "prune", hours, error = %e, "Prune failed");
                ToolOutput::Error(format!("Failed to prune entries: {}", e))
            }
        })
    }
}
