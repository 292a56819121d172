//! Background retention task
//!
//! Periodically prunes entries older than the configured age.

use super::{EntryStore, PruneSummary};
use crate::signals::ShutdownSignal;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

/// Retention configuration
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    /// Entries older than this are deleted
    pub max_age_hours: u64,

    /// How often the prune runs
    pub check_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            check_interval: Duration::from_secs(3600),
        }
    }
}

impl From<&crate::config::RetentionSettings> for RetentionConfig {
    fn from(settings: &crate::config::RetentionSettings) -> Self {
        Self {
            max_age_hours: settings.hours,
            check_interval: Duration::from_secs(settings.check_interval_seconds.max(1)),
        }
    }
}

/// Spawn the background retention task
///
/// The first prune runs one full interval after startup. The task exits when
/// `shutdown` fires.
///
/// # Example
///
/// ```ignore
/// let handle = spawn_retention_task(store.clone(), RetentionConfig::default(), shutdown_rx);
/// ```
pub fn spawn_retention_task(
    store: Arc<dyn EntryStore>,
    config: RetentionConfig,
    shutdown: broadcast::Receiver<ShutdownSignal>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        retention_loop(store, config, shutdown).await;
    })
}

async fn retention_loop(
    store: Arc<dyn EntryStore>,
    config: RetentionConfig,
    mut shutdown: broadcast::Receiver<ShutdownSignal>,
) {
    let start = time::Instant::now() + config.check_interval;
    let mut interval = time::interval_at(start, config.check_interval);

    tracing::info!(
        max_age_hours = config.max_age_hours,
        interval_secs = config.check_interval.as_secs(),
        "Retention task started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match store.prune(config.max_age_hours).await {
                    Ok(summary) => {
                        tracing::info!(
                            entries_deleted = summary.entries_deleted,
                            cutoff = %summary.cutoff,
                            "Scheduled prune completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled prune failed");
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Retention task stopping");
                break;
            }
        }
    }
}

/// Run a prune immediately (CLI `prune`, tests)
pub async fn run_prune_now(store: &dyn EntryStore, max_age_hours: u64) -> Result<PruneSummary> {
    tracing::info!(max_age_hours, "Running manual prune");

    let summary = store.prune(max_age_hours).await?;

    tracing::info!(
        entries_deleted = summary.entries_deleted,
        tags_deleted = summary.tags_deleted,
        "Manual prune completed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntryType, NewEntry, SqliteEntryStore};
    use chrono::{TimeDelta, Utc};
    use serde_json::json;

    async fn create_test_store() -> Arc<SqliteEntryStore> {
        Arc::new(SqliteEntryStore::new("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_run_prune_now() {
        let store = create_test_store().await;

        store
            .insert_entries_batch(&[
                NewEntry::new(EntryType::Log, json!({"message": "old"}))
                    .created_at(Utc::now() - TimeDelta::hours(3)),
                NewEntry::new(EntryType::Log, json!({"message": "recent"})),
            ])
            .await
            .unwrap();

        let summary = run_prune_now(store.as_ref(), 2).await.unwrap();
        assert_eq!(summary.entries_deleted, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_retention_task_stops_on_shutdown() {
        let store = create_test_store().await;
        let (tx, rx) = broadcast::channel(1);

        let config = RetentionConfig {
            max_age_hours: 1,
            check_interval: Duration::from_millis(10),
        };

        store
            .insert_entry(
                &NewEntry::new(EntryType::Dump, json!({"dump": "x"}))
                    .created_at(Utc::now() - TimeDelta::hours(5)),
            )
            .await
            .unwrap();

        let handle = spawn_retention_task(store.clone(), config, rx);
        tokio::time::sleep(Duration::from_millis(100)).await;

        tx.send(ShutdownSignal::Graceful).unwrap();
        handle.await.unwrap();

        assert_eq!(store.stats().await.unwrap().total_entries, 0);
    }

    #[test]
    fn test_default_config() {
        let config = RetentionConfig::default();
        assert_eq!(config.max_age_hours, 24);
        assert_eq!(config.check_interval, Duration::from_secs(3600));
    }
}
