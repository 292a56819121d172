//! Tool handlers over the entry store

pub mod args;
pub mod catalog;
pub mod entry_tool;
pub mod prune;

pub use entry_tool::EntryTool;
pub use prune::PruneTool;

use crate::mcp::ToolRegistry;
use crate::store::EntryStore;
use std::sync::Arc;

/// Register one tool per catalog entry, plus `prune`
pub fn build_registry(store: Arc<dyn EntryStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for spec in catalog::TOOL_SPECS {
        registry.register(Arc::new(EntryTool::new(spec, store.clone())));
    }
    registry.register(Arc::new(PruneTool::new(store)));

    registry
}
