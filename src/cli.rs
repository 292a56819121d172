use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "telescope-mcp",
    version,
    about = "Expose recorded application debugging entries as MCP tools"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = telescope_mcp::config::DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the HTTP front door (default)
    Serve,

    /// Serve JSON-RPC over stdin/stdout
    Stdio,

    /// List registered tools
    Tools {
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke one tool and print its output
    Call {
        /// Tool name, e.g. `requests`
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// Delete entries older than the given age
    Prune {
        /// Maximum age in hours (defaults to retention.hours)
        #[arg(long)]
        hours: Option<u64>,
    },

    /// Show entry counts per type
    Stats,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration (with secrets masked)
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
