use anyhow::Result;
use telescope_mcp::{config::Config, mcp::McpService, stdio::StdioServer};
use tracing::info;

use super::open_dispatcher;

/// Execute the stdio command
///
/// Nothing but protocol frames may reach stdout here, so there is no
/// colored banner. Ends on EOF or Ctrl+C.
pub async fn execute(cfg: Config) -> Result<()> {
    let (_store, dispatcher) = open_dispatcher(&cfg).await?;
    let server = StdioServer::new(McpService::new(dispatcher));

    info!(database = %cfg.database.url, "Serving MCP over stdio");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, stopping stdio server");
        }
    }

    Ok(())
}
