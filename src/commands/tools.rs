use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use telescope_mcp::{config::Config, mcp::Manifest};

use super::open_dispatcher;

/// Execute the tools command
pub async fn execute(cfg: &Config, json: bool) -> Result<()> {
    let (_store, dispatcher) = open_dispatcher(cfg).await?;
    let manifest = dispatcher.manifest();

    if json {
        println!("{}", serde_json::to_string_pretty(manifest)?);
        return Ok(());
    }

    println!(
        "{} {} v{}",
        "Tools of".bold(),
        manifest.name.cyan(),
        manifest.version
    );
    println!();
    println!("{}", tools_table(manifest));
    println!();
    println!("{} {}", "Total:".bold(), manifest.tools.len());

    Ok(())
}

fn tools_table(manifest: &Manifest) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("TOOL").fg(Color::Cyan),
        Cell::new("PARAMETERS").fg(Color::Cyan),
        Cell::new("DESCRIPTION").fg(Color::Cyan),
    ]);

    for tool in &manifest.tools {
        table.add_row(vec![
            Cell::new(&tool.name),
            Cell::new(parameter_names(&tool.input_schema)),
            Cell::new(&tool.description),
        ]);
    }

    table
}

/// Comma-separated property names of an input schema
fn parameter_names(schema: &serde_json::Value) -> String {
    schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|props| props.keys().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}
