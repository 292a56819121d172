use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use telescope_mcp::config::{self, Config};
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration (file + environment) with API keys masked
pub fn show(cfg: &Config) -> Result<()> {
    info!("Displaying configuration");

    let sanitized = sanitize_secrets(cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(&sanitized)?);

    Ok(())
}

/// Execute the config validate command
pub fn validate(path: &Path) -> Result<()> {
    println!(
        "{} {}",
        "Validating configuration...".yellow(),
        path.display()
    );

    let cfg = match config::load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{} {:#}", "✗ Configuration is invalid:".red().bold(), e);
            return Err(e);
        }
    };

    if !path.exists() {
        println!(
            "{}",
            "  (file not found, using defaults and environment)".dimmed()
        );
    }

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {}", "Database".cyan(), cfg.database.url);
    println!(
        "  {}: {} ({} API keys, {} enabled)",
        "Auth".cyan(),
        enabled_label(cfg.auth.enabled),
        cfg.auth.api_keys.len(),
        cfg.auth.api_keys.iter().filter(|k| k.enabled).count()
    );
    println!(
        "  {}: {} ({} hours)",
        "Retention".cyan(),
        enabled_label(cfg.retention.enabled),
        cfg.retention.hours
    );
    println!(
        "  {}: {} ({})",
        "Metrics".cyan(),
        enabled_label(cfg.metrics.enabled),
        cfg.metrics.endpoint
    );

    Ok(())
}

fn enabled_label(enabled: bool) -> colored::ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".red()
    }
}

/// Copy of the configuration that is safe to print
fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    for key in &mut sanitized.auth.api_keys {
        key.key = sanitize_key(&key.key);
    }
    sanitized
}

/// Mask an API key for safe display
///
/// Shows the first 4 and last 4 characters
/// Example: "tmcp-1234567890abcdef" -> "tmcp...cdef"
fn sanitize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        // Too short to mask meaningfully
        return "***".to_string();
    }

    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
