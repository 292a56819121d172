use anyhow::{Context, Result};
use colored::Colorize;
use telescope_mcp::{
    config::Config,
    format::format_timestamp,
    store::{run_prune_now, SqliteEntryStore},
};
use tracing::info;

/// Execute the prune command
///
/// `hours` falls back to `retention.hours`.
pub async fn execute(cfg: &Config, hours: Option<u64>) -> Result<()> {
    let hours = hours.unwrap_or(cfg.retention.hours);
    if hours == 0 {
        anyhow::bail!("--hours must be at least 1");
    }

    let store = SqliteEntryStore::connect(&cfg.database)
        .await
        .with_context(|| format!("Failed to open entry database {}", cfg.database.url))?;

    println!(
        "{}",
        format!("Pruning entries older than {} hours...", hours).yellow()
    );
    let summary = run_prune_now(&store, hours).await?;

    println!(
        "{} {} entries, {} tags (cutoff {})",
        "✓ Deleted".green(),
        summary.entries_deleted,
        summary.tags_deleted,
        format_timestamp(&summary.cutoff)
    );
    info!(
        entries_deleted = summary.entries_deleted,
        hours, "Manual prune completed"
    );

    Ok(())
}
