//! Batch correlation
//!
//! Everything recorded while handling one request (queries, logs, cache hits,
//! mail, ...) shares the request's `batch_id`. These helpers go from a root
//! entry to its batch, and never fail the caller: store errors are logged at
//! `warn` and surface as `None` or an empty result.

use super::{Entry, EntryStore, EntryType};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct BatchCorrelation {
    store: Arc<dyn EntryStore>,
}

impl BatchCorrelation {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Batch id of an entry, if the entry exists and was recorded in a batch
    pub async fn batch_id_for(&self, entry_id: &str) -> Option<String> {
        match self.store.find(entry_id).await {
            Ok(entry) => entry.and_then(|e| e.batch_id),
            Err(e) => {
                tracing::warn!(entry_id, error = %e, "Failed to resolve batch id");
                None
            }
        }
    }

    /// Entries of one type in a batch, ascending by sequence
    pub async fn entries_in_batch(
        &self,
        batch_id: &str,
        entry_type: EntryType,
        limit: usize,
    ) -> Vec<Entry> {
        self.store
            .batch_entries(batch_id, entry_type, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(batch_id, entry_type = %entry_type, error = %e, "Failed to load batch entries");
                Vec::new()
            })
    }

    /// Count of entries per type in a batch
    pub async fn batch_summary(&self, batch_id: &str) -> BTreeMap<EntryType, u64> {
        match self.store.batch_counts(batch_id).await {
            Ok(counts) => counts.into_iter().filter(|(_, n)| *n > 0).collect(),
            Err(e) => {
                tracing::warn!(batch_id, error = %e, "Failed to summarize batch");
                BTreeMap::new()
            }
        }
    }

    /// Batch summary for the entries related to `entry`, excluding its own type
    pub async fn related_summary(&self, entry: &Entry) -> BTreeMap<EntryType, u64> {
        let Some(batch_id) = entry.batch_id.as_deref() else {
            return BTreeMap::new();
        };

        let mut summary = self.batch_summary(batch_id).await;
        summary.remove(&entry.entry_type);
        summary
    }
}
