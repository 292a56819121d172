//! SQLite entry store
//!
//! This module provides async database operations with:
//! - Connection pooling
//! - Automatic migrations
//! - Batch inserts for seeding
//! - WAL mode for concurrent reads/writes

use super::query::EntryQuery;
use super::{Entry, EntryStore, EntryType, PruneSummary};
use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

/// Columns selected for every entry read; tags are folded into a JSON array
const ENTRY_COLUMNS: &str = "sequence, uuid, batch_id, family_hash, type, content, created_at, \
     (SELECT json_group_array(tag) FROM entry_tags WHERE entry_tags.entry_uuid = entries.uuid) AS tags";

/// Entry to be written, used by seeding, tests and the recorder side
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub id: String,
    pub batch_id: Option<String>,
    pub family_hash: Option<String>,
    pub entry_type: EntryType,
    pub content: serde_json::Value,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NewEntry {
    pub fn new(entry_type: EntryType, content: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            batch_id: None,
            family_hash: None,
            entry_type,
            content,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn in_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn with_family_hash(mut self, hash: impl Into<String>) -> Self {
        self.family_hash = Some(hash.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Entry store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entries: u64,
    pub by_type: BTreeMap<String, u64>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Entry store handle
///
/// Manages the SQLite connection pool and implements [`EntryStore`].
pub struct SqliteEntryStore {
    pool: SqlitePool,
}

impl SqliteEntryStore {
    /// Open a store with default pool settings
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = SqliteEntryStore::new("sqlite:./data/telescope.db").await?;
    /// ```
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(&DatabaseConfig {
            url: database_url.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Open a store from configuration, creating the file and running migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database url: {}", config.url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_seconds))
            .pragma("cache_size", "-64000") // 64MB cache
            .pragma("temp_store", "memory")
            .pragma("synchronous", "NORMAL");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
            .connect_with(options)
            .await
            .context("Failed to connect to entry database")?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .context("Failed to run entry database migrations")?;

        tracing::debug!("Entry database migrations completed");
        Ok(())
    }

    /// Insert a single entry with its tags, returning its sequence
    pub async fn insert_entry(&self, entry: &NewEntry) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let sequence = insert_in_tx(&mut tx, entry).await?;
        tx.commit().await?;

        Ok(sequence)
    }

    /// Insert multiple entries in a single transaction
    ///
    /// Sequences follow slice order.
    pub async fn insert_entries_batch(&self, entries: &[NewEntry]) -> Result<Vec<i64>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut sequences = Vec::with_capacity(entries.len());

        for entry in entries {
            sequences.push(insert_in_tx(&mut tx, entry).await?);
        }

        tx.commit().await?;

        Ok(sequences)
    }

    /// Get per-type entry counts and the covered time range
    pub async fn stats(&self) -> Result<StoreStats> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT type, COUNT(*) FROM entries GROUP BY type ORDER BY type")
                .fetch_all(&self.pool)
                .await
                .context("Failed to count entries")?;

        let (oldest, newest): (Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT MIN(created_at), MAX(created_at) FROM entries")
                .fetch_one(&self.pool)
                .await?;

        let by_type: BTreeMap<String, u64> = counts
            .into_iter()
            .map(|(t, n)| (t, n as u64))
            .collect();

        Ok(StoreStats {
            total_entries: by_type.values().sum(),
            by_type,
            oldest: oldest.and_then(DateTime::from_timestamp_millis),
            newest: newest.and_then(DateTime::from_timestamp_millis),
        })
    }

    /// Cheap connectivity check for readiness probes
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Entry database is unreachable")?;
        Ok(())
    }

    fn select() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT {} FROM entries", ENTRY_COLUMNS))
    }
}

async fn insert_in_tx(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    entry: &NewEntry,
) -> Result<i64> {
    let content = serde_json::to_string(&entry.content)?;

    let result = sqlx::query(
        "INSERT INTO entries (uuid, batch_id, family_hash, type, content, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(&entry.batch_id)
    .bind(&entry.family_hash)
    .bind(entry.entry_type.as_str())
    .bind(&content)
    .bind(entry.created_at.timestamp_millis())
    .execute(&mut **tx)
    .await
    .with_context(|| format!("Failed to insert entry {}", entry.id))?;

    for tag in &entry.tags {
        sqlx::query("INSERT OR IGNORE INTO entry_tags (entry_uuid, tag) VALUES (?, ?)")
            .bind(&entry.id)
            .bind(tag)
            .execute(&mut **tx)
            .await?;
    }

    Ok(result.last_insert_rowid())
}

fn entry_from_row(row: &SqliteRow) -> Result<Entry> {
    let raw_type: String = row.try_get("type")?;
    let raw_content: String = row.try_get("content")?;
    let raw_tags: Option<String> = row.try_get("tags")?;
    let created_ms: i64 = row.try_get("created_at")?;
    let id: String = row.try_get("uuid")?;

    let content = serde_json::from_str(&raw_content)
        .with_context(|| format!("Entry {} has malformed content", id))?;

    let mut tags: Vec<String> = match raw_tags {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };
    tags.sort();

    Ok(Entry {
        sequence: row.try_get("sequence")?,
        batch_id: row.try_get("batch_id")?,
        family_hash: row.try_get("family_hash")?,
        entry_type: raw_type.parse()?,
        tags,
        content,
        created_at: DateTime::from_timestamp_millis(created_ms)
            .with_context(|| format!("Entry {} has invalid timestamp {}", id, created_ms))?,
        id,
    })
}

fn prune_cutoff(now: DateTime<Utc>, max_age_hours: u64) -> DateTime<Utc> {
    i64::try_from(max_age_hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    async fn find(&self, id: &str) -> Result<Option<Entry>> {
        let mut qb = Self::select();
        qb.push(" WHERE uuid = ");
        qb.push_bind(id.to_string());

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load entry {}", id))?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn list(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let mut qb = Self::select();
        query.push_where(&mut qb);
        qb.push(" ORDER BY sequence DESC LIMIT ");
        qb.push_bind(query.limit as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {} entries", query.entry_type))?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn batch_entries(
        &self,
        batch_id: &str,
        entry_type: EntryType,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let mut qb = Self::select();
        qb.push(" WHERE batch_id = ");
        qb.push_bind(batch_id.to_string());
        qb.push(" AND type = ");
        qb.push_bind(entry_type.as_str());
        qb.push(" ORDER BY sequence ASC LIMIT ");
        qb.push_bind(limit as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to load batch {}", batch_id))?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn batch_counts(&self, batch_id: &str) -> Result<Vec<(EntryType, u64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT type, COUNT(*) FROM entries WHERE batch_id = ? GROUP BY type ORDER BY type",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to count batch {}", batch_id))?;

        let mut counts = Vec::with_capacity(rows.len());
        for (raw_type, count) in rows {
            match raw_type.parse::<EntryType>() {
                Ok(entry_type) => counts.push((entry_type, count as u64)),
                Err(_) => tracing::debug!(batch_id, entry_type = %raw_type, "Skipping unknown entry type"),
            }
        }

        Ok(counts)
    }

    async fn prune(&self, max_age_hours: u64) -> Result<PruneSummary> {
        let cutoff = prune_cutoff(Utc::now(), max_age_hours);
        let cutoff_ms = cutoff.timestamp_millis();

        let mut tx = self.pool.begin().await?;

        let tags = sqlx::query(
            "DELETE FROM entry_tags WHERE entry_uuid IN (SELECT uuid FROM entries WHERE created_at < ?)",
        )
        .bind(cutoff_ms)
        .execute(&mut *tx)
        .await
        .context("Failed to delete entry tags")?;

        let entries = sqlx::query("DELETE FROM entries WHERE created_at < ?")
            .bind(cutoff_ms)
            .execute(&mut *tx)
            .await
            .context("Failed to delete entries")?;

        tx.commit().await?;

        tracing::info!(
            max_age_hours,
            entries_deleted = entries.rows_affected(),
            tags_deleted = tags.rows_affected(),
            "Pruned old entries"
        );

        Ok(PruneSummary {
            entries_deleted: entries.rows_affected(),
            tags_deleted: tags.rows_affected(),
            cutoff,
        })
    }
}
