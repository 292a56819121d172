//! Entry store for recorded debugging data
//!
//! The store is an append-only SQLite table of entries (requests, queries,
//! logs, exceptions, ...). Each entry carries a type tag, an optional batch id
//! shared by everything recorded during one unit of work, a monotonic
//! sequence and a free-form JSON payload.
//!
//! ## Layout
//!
//! ```text
//! EntryStore (trait)          <- tools, batch correlation, retention
//!     ↑
//! SqliteEntryStore (sqlx)     <- entries + entry_tags tables
//! ```
//!
//! Everything in this crate reads through [`EntryStore`]; the only write path
//! exposed to tool callers is [`EntryStore::prune`].

pub mod batch;
pub mod database;
pub mod query;
pub mod retention;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use batch::BatchCorrelation;
pub use database::{NewEntry, SqliteEntryStore, StoreStats};
pub use query::{ContentFilter, EntryQuery, FilterValue, Matcher};
pub use retention::{run_prune_now, spawn_retention_task, RetentionConfig};

/// Type tag of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Request,
    Query,
    Log,
    Exception,
    Job,
    Cache,
    Model,
    Mail,
    Notification,
    Event,
    Gate,
    View,
    Dump,
    Command,
    Schedule,
    Batch,
    Redis,
    ClientRequest,
}

impl EntryType {
    pub const ALL: [EntryType; 18] = [
        EntryType::Request,
        EntryType::Query,
        EntryType::Log,
        EntryType::Exception,
        EntryType::Job,
        EntryType::Cache,
        EntryType::Model,
        EntryType::Mail,
        EntryType::Notification,
        EntryType::Event,
        EntryType::Gate,
        EntryType::View,
        EntryType::Dump,
        EntryType::Command,
        EntryType::Schedule,
        EntryType::Batch,
        EntryType::Redis,
        EntryType::ClientRequest,
    ];

    /// Tag as stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Query => "query",
            Self::Log => "log",
            Self::Exception => "exception",
            Self::Job => "job",
            Self::Cache => "cache",
            Self::Model => "model",
            Self::Mail => "mail",
            Self::Notification => "notification",
            Self::Event => "event",
            Self::Gate => "gate",
            Self::View => "view",
            Self::Dump => "dump",
            Self::Command => "command",
            Self::Schedule => "schedule",
            Self::Batch => "batch",
            Self::Redis => "redis",
            Self::ClientRequest => "client_request",
        }
    }

    /// Human-readable plural, used in related-entry breakdowns
    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::Request => "Requests",
            Self::Query => "Queries",
            Self::Log => "Logs",
            Self::Exception => "Exceptions",
            Self::Job => "Jobs",
            Self::Cache => "Cache Operations",
            Self::Model => "Model Events",
            Self::Mail => "Mail",
            Self::Notification => "Notifications",
            Self::Event => "Events",
            Self::Gate => "Gate Checks",
            Self::View => "Views",
            Self::Dump => "Dumps",
            Self::Command => "Commands",
            Self::Schedule => "Scheduled Tasks",
            Self::Batch => "Batches",
            Self::Redis => "Redis Commands",
            Self::ClientRequest => "HTTP Client Requests",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // "scheduled_task" is accepted as an alias of the stored "schedule" tag
        if s == "scheduled_task" {
            return Ok(Self::Schedule);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown entry type: {}", s))
    }
}

/// One recorded entry, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    pub sequence: i64,
    pub batch_id: Option<String>,
    pub family_hash: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub tags: Vec<String>,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Look up a content field by dotted path (e.g. `response.status`)
    pub fn field(&self, path: &str) -> Option<&serde_json::Value> {
        path.split('.')
            .try_fold(&self.content, |value, key| value.get(key))
            .filter(|v| !v.is_null())
    }
}

/// Result of an age-based prune
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneSummary {
    pub entries_deleted: u64,
    pub tags_deleted: u64,
    pub cutoff: DateTime<Utc>,
}

/// Read access to recorded entries, plus the one destructive prune
///
/// Implementations must honour the query limit and never return entries of a
/// different type than requested.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Find a single entry by id
    async fn find(&self, id: &str) -> Result<Option<Entry>>;

    /// Newest-first listing of one entry type with filters and a row limit
    async fn list(&self, query: &EntryQuery) -> Result<Vec<Entry>>;

    /// Entries of `entry_type` in `batch_id`, ascending by sequence
    async fn batch_entries(
        &self,
        batch_id: &str,
        entry_type: EntryType,
        limit: usize,
    ) -> Result<Vec<Entry>>;

    /// Per-type entry counts within a batch
    async fn batch_counts(&self, batch_id: &str) -> Result<Vec<(EntryType, u64)>>;

    /// Delete entries older than `max_age_hours`
    async fn prune(&self, max_age_hours: u64) -> Result<PruneSummary>;
}
