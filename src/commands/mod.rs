//! Command implementations for the CLI
//!
//! - serve: HTTP front door
//! - stdio: JSON-RPC over stdin/stdout
//! - tools: list registered tools
//! - call: one-shot tool invocation
//! - prune: delete old entries now
//! - stats: entry counts per type
//! - config: configuration display and validation

pub mod call;
pub mod config;
pub mod prune;
pub mod serve;
pub mod stats;
pub mod stdio;
pub mod tools;

use anyhow::{Context, Result};
use std::sync::Arc;
use telescope_mcp::{
    config::Config,
    mcp::Dispatcher,
    server,
    store::SqliteEntryStore,
};

/// Open the configured entry database and register every tool over it
async fn open_dispatcher(cfg: &Config) -> Result<(Arc<SqliteEntryStore>, Arc<Dispatcher>)> {
    let store = Arc::new(
        SqliteEntryStore::connect(&cfg.database)
            .await
            .with_context(|| format!("Failed to open entry database {}", cfg.database.url))?,
    );
    let dispatcher = server::create_dispatcher(cfg, store.clone());

    Ok((store, dispatcher))
}

pub fn version() {
    println!("telescope-mcp v{}", env!("CARGO_PKG_VERSION"));
    println!("MCP protocol {}", telescope_mcp::mcp::protocol::PROTOCOL_VERSION);
}
