//! Stats command implementation
//!
//! Prints how many entries of each type the database holds and the time
//! range they cover.

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use telescope_mcp::{
    config::Config,
    format::format_timestamp,
    store::{SqliteEntryStore, StoreStats},
};

/// Execute the stats command
pub async fn execute(cfg: &Config) -> Result<()> {
    let store = SqliteEntryStore::connect(&cfg.database)
        .await
        .with_context(|| format!("Failed to open entry database {}", cfg.database.url))?;
    let stats = store.stats().await?;

    println!("{} {}", "Database:".bold(), cfg.database.url.cyan());

    if stats.total_entries == 0 {
        println!("{}", "No entries recorded.".yellow());
        return Ok(());
    }

    println!("{}", stats_table(&stats));
    println!(
        "{} {}",
        "Total:".bold(),
        format_number(stats.total_entries)
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!(
            "{} {} → {}",
            "Range:".bold(),
            format_timestamp(&oldest),
            format_timestamp(&newest)
        );
    }

    Ok(())
}

fn stats_table(stats: &StoreStats) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("TYPE").fg(Color::Cyan),
        Cell::new("ENTRIES").fg(Color::Cyan),
        Cell::new("SHARE").fg(Color::Cyan),
    ]);

    for (entry_type, count) in &stats.by_type {
        let share = *count as f64 / stats.total_entries as f64 * 100.0;
        table.add_row(vec![
            Cell::new(entry_type),
            Cell::new(format_number(*count)),
            Cell::new(format!("{:.1}%", share)),
        ]);
    }

    table
}

/// Format large counts as 1.2K / 3.4M
fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5K");
        assert_eq!(format_number(2_300_000), "2.3M");
    }
}
