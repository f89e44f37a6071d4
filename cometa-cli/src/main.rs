//! Cometa device client CLI.
//!
//! A command-line rendition of the vanilla Linux device example
//! (`cometa-client.c`): subscribes one device to an application on the
//! Cometa relay, echoes received messages, and periodically sends a
//! timestamp upstream.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cometa-client",
    author,
    version,
    about = "Device-side client for the Cometa cloud relay",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe a device and run its message loop
    Client(commands::client::ClientArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Client(args) => commands::client::run(args).await,
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
