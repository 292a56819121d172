//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! stdout carries protocol frames only; logging goes to stderr.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::{ErrorCode, McpService, RpcError, RpcResponse};
use serde_json::Value;

pub struct StdioServer {
    mcp: McpService,
}

impl StdioServer {
    pub fn new(mcp: McpService) -> Self {
        Self { mcp }
    }

    /// Serve until `reader` reaches EOF, returning the number of messages handled
    ///
    /// Blank lines are skipped. Each response is written as one line and
    /// flushed immediately; notifications produce no output. A line that is
    /// not UTF-8 is answered with a parse error and the session continues.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<u64>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        let mut handled = 0u64;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read from input")?;
            if read == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    handled += 1;
                    self.mcp.handle_raw(line).await
                }
                Err(e) => {
                    handled += 1;
                    tracing::debug!(error = %e, "Input line is not valid UTF-8");
                    Some(RpcResponse::failure(
                        Value::Null,
                        RpcError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
                    ))
                }
            };

            let Some(response) = response else {
                continue;
            };

            let mut frame = serde_json::to_vec(&response)?;
            frame.push(b'\n');
            writer.write_all(&frame).await.context("Failed to write response")?;
            writer.flush().await?;
        }

        tracing::debug!(messages = handled, "Input closed");
        Ok(handled)
    }

    /// Serve the process's stdin/stdout
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::test_state;
    use std::io::Cursor;

    async fn run_session(input: &str) -> (u64, Vec<Value>) {
        let state = test_state().await;
        let server = StdioServer::new(state.mcp);
        let mut output = Vec::new();

        let handled = server
            .serve(Cursor::new(input.as_bytes().to_vec()), &mut output)
            .await
            .unwrap();

        let responses = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (handled, responses)
    }

    #[tokio::test]
    async fn test_initialize_then_list() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let (handled, responses) = run_session(input).await;

        assert_eq!(handled, 3);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 19);
    }

    #[tokio::test]
    async fn test_tool_call_over_stdio() {
        let input = r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"exceptions","arguments":{}}}"#;

        let (_, responses) = run_session(input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], "a");
        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("No exceptions found."));
    }

    #[tokio::test]
    async fn test_blank_lines_and_bad_json() {
        let input = "\n   \nnot json\n";

        let (handled, responses) = run_session(input).await;

        assert_eq!(handled, 1);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let state = test_state().await;
        let server = StdioServer::new(state.mcp);
        let mut input = b"\xff\xfe bad bytes\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        let handled = server.serve(Cursor::new(input), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(handled, 2);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["id"], 7);
        assert_eq!(responses[1]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (handled, responses) = run_session("").await;
        assert_eq!(handled, 0);
        assert!(responses.is_empty());
    }
}
