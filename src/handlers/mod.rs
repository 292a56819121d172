pub mod health;
pub mod mcp;
pub mod metrics_handler;

use crate::mcp::McpService;
use crate::store::SqliteEntryStore;
use std::sync::Arc;

/// Shared state of the authenticated and readiness routes
#[derive(Clone)]
pub struct AppState {
    pub mcp: McpService,
    pub store: Arc<SqliteEntryStore>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;

    /// State over an empty in-memory store with every tool registered
    pub(crate) async fn test_state() -> AppState {
        let store = Arc::new(SqliteEntryStore::new("sqlite::memory:").await.unwrap());
        let dispatcher = crate::server::create_dispatcher(&Config::default(), store.clone());

        AppState {
            mcp: McpService::new(dispatcher),
            store,
        }
    }
}
