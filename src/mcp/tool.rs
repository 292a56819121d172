//! Tool handler contract and response shapes

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name, description and JSON Schema of a tool, fixed at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Text,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Error,
            text: text.into(),
        }
    }
}

/// What a handler hands back before normalisation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Error(String),
    Blocks(Vec<ContentBlock>),
}

/// Normalised result of `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::error(text)],
            is_error: true,
        }
    }

    /// All block texts joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ToolOutput> for ToolResponse {
    fn from(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Text(text) => Self {
                content: vec![ContentBlock::text(text)],
                is_error: false,
            },
            ToolOutput::Error(text) => Self::error(text),
            ToolOutput::Blocks(content) => Self {
                is_error: content.iter().any(|b| b.kind == BlockKind::Error),
                content,
            },
        }
    }
}

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError>;
}
