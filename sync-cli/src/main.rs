//! # picochat
//!
//! Terminal driver for the picochat low-memory Matrix client.
//!
//! ## Commands
//!
//! - `init`: Write a starter configuration file
//! - `sync`: Run one probe and one incremental cycle, print the history
//! - `send`: Send one text message
//! - `run`: Interactive loop (periodic sync, line-buffered compose)
//!
//! ## Example
//!
//! ```bash
//! # Write picochat.toml
//! picochat init --homeserver https://matrix.org --room '!abc:matrix.org' --token syt_...
//!
//! # One-shot sync
//! picochat sync
//!
//! # Send a message
//! picochat send "hello from a very small device"
//!
//! # Interactive
//! RUST_LOG=picochat_client=debug picochat run
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use picochat_client::ClientConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{init, run, send, sync};

/// Terminal driver for the picochat low-memory Matrix client.
#[derive(Parser, Debug)]
#[command(name = "picochat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "picochat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter configuration file
    Init {
        /// Homeserver base URL
        #[arg(long)]
        homeserver: String,

        /// Room to follow
        #[arg(long)]
        room: String,

        /// Access token
        #[arg(long)]
        token: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run one probe and one incremental cycle, then print the history
    Sync,

    /// Send one text message
    Send {
        /// Message text
        text: String,
    },

    /// Interactive loop: type a line and press enter to send
    Run,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't interleave with the history view
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init {
            homeserver,
            room,
            token,
            force,
        } => init::run(&cli.config, &homeserver, &room, &token, force),
        Commands::Sync => sync::run(&load_config(&cli.config)?),
        Commands::Send { text } => send::run(&load_config(&cli.config)?, &text),
        Commands::Run => run::run(&load_config(&cli.config)?),
    }
}

fn load_config(path: &std::path::Path) -> Result<ClientConfig> {
    let config = ClientConfig::from_file(path)
        .with_context(|| format!("Failed to load {} (try 'picochat init')", path.display()))?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
