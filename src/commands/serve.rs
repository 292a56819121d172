use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use telescope_mcp::{config::Config, server};
use tracing::info;

/// Execute the serve command
///
/// Blocks until SIGINT/SIGTERM; SIGHUP reloads `config_path`.
pub async fn execute(cfg: Config, config_path: PathBuf) -> Result<()> {
    eprintln!(
        "{} http://{}:{}",
        "Serving MCP tools on".green(),
        cfg.server.host,
        cfg.server.port
    );
    info!(config = %config_path.display(), "Starting HTTP front door");

    server::start_server(cfg, config_path).await
}
