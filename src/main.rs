use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use telescope_mcp::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.get_command();

    // Commands that must run without a valid configuration
    match &command {
        cli::Commands::Version => {
            commands::version();
            return Ok(());
        }
        cli::Commands::Config {
            action: cli::ConfigCommands::Validate,
        } => {
            return commands::config::validate(&args.config);
        }
        _ => {}
    }

    let cfg = config::load_config(&args.config)?;

    // Held until main returns so buffered log lines are flushed
    let _log_guard = init_tracing(&cfg.server.log_level, &cfg.server.log_format);

    match command {
        cli::Commands::Serve => commands::serve::execute(cfg, args.config).await?,
        cli::Commands::Stdio => commands::stdio::execute(cfg).await?,
        cli::Commands::Tools { json } => commands::tools::execute(&cfg, json).await?,
        cli::Commands::Call { tool, args } => {
            commands::call::execute(&cfg, &tool, args.as_deref()).await?
        }
        cli::Commands::Prune { hours } => commands::prune::execute(&cfg, hours).await?,
        cli::Commands::Stats => commands::stats::execute(&cfg).await?,
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&cfg)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => commands::version(),
    }

    Ok(())
}
