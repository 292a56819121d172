use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{Map, Value};
use telescope_mcp::{config::Config, error::DispatchError, mcp::ToolResponse};

use super::open_dispatcher;

/// Execute the call command
///
/// Prints the tool's text output. An error response is printed to stderr
/// and turned into a non-zero exit.
pub async fn execute(cfg: &Config, tool: &str, args: Option<&str>) -> Result<()> {
    let arguments = parse_arguments(args)?;
    let (_store, dispatcher) = open_dispatcher(cfg).await?;

    if !dispatcher.has(tool) {
        let known = dispatcher.tool_names().join(", ");
        anyhow::bail!("Unknown tool '{}'. Available tools: {}", tool, known);
    }

    let response = match dispatcher.invoke(tool, &arguments).await {
        Ok(response) => response,
        Err(DispatchError::ToolFailed { source, .. }) => ToolResponse::error(source.to_string()),
        Err(e) => return Err(e.into()),
    };

    if response.is_error {
        eprintln!("{}", response.text().red());
        anyhow::bail!("Tool '{}' returned an error", tool);
    }

    println!("{}", response.text());
    Ok(())
}

/// Parse `--args`; absent means no arguments
fn parse_arguments(args: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = args else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(raw).context("--args is not valid JSON")? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => anyhow::bail!("--args must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments(None).unwrap().is_empty());
        assert!(parse_arguments(Some("null")).unwrap().is_empty());

        let map = parse_arguments(Some(r#"{"limit": 5, "slow": true}"#)).unwrap();
        assert_eq!(map["limit"], 5);
        assert_eq!(map["slow"], true);
    }

    #[test]
    fn test_parse_arguments_rejects_non_objects() {
        assert!(parse_arguments(Some("[1]")).is_err());
        assert!(parse_arguments(Some("{oops")).is_err());
    }
}
