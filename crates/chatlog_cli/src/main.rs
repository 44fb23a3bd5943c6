//! Chatlog CLI
//!
//! Command-line client for the chatlog message service.
//!
//! # Commands
//!
//! - `list` - Print the current message log
//! - `post` - Post a message
//! - `delete` - Delete one message by id
//! - `clear` - Clear the whole log (requires the shared password)
//! - `watch` - Run the moderation gate, then follow the log until Ctrl-C

mod commands;

use chatlog_client::ClientConfig;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Chatlog command-line client.
#[derive(Parser)]
#[command(name = "chatlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the message service
    #[arg(
        global = true,
        short,
        long,
        env = "CHATLOG_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    url: String,

    /// Polling interval in milliseconds
    #[arg(global = true, long, default_value_t = 2000)]
    interval_ms: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current message log
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Post a message
    Post {
        /// Message content
        content: String,
    },

    /// Delete one message by id
    Delete {
        /// Message id
        id: String,
    },

    /// Clear the whole log
    Clear {
        /// Shared password (prompted for if omitted)
        #[arg(long, env = "CHATLOG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Run the moderation gate, then follow the log until Ctrl-C
    Watch {
        /// Skip the clear prompt and start following immediately
        #[arg(long)]
        skip_gate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config =
        ClientConfig::new(cli.url).with_poll_interval(Duration::from_millis(cli.interval_ms));

    match cli.command {
        Commands::List { format } => commands::actions::list(config, &format).await?,
        Commands::Post { content } => commands::actions::post(config, &content).await?,
        Commands::Delete { id } => commands::actions::delete(config, id).await?,
        Commands::Clear { password } => commands::actions::clear(config, password).await?,
        Commands::Watch { skip_gate } => commands::watch::run(config, skip_gate).await?,
    }

    Ok(())
}
