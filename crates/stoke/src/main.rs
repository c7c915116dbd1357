//! Stoke CLI - development server and build tooling for web app projects.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod env;
mod files;
mod metadata;
mod paths;
mod port;
mod prompt;
mod urls;

#[derive(Parser)]
#[command(name = "stoke")]
#[command(about = "Development server and build tooling for web app projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the development server
    Start {
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Create a production build
    Build {
        /// Output directory (defaults to "build")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Start { no_open } => {
            commands::start::run(!no_open).await?;
        }
        Commands::Build { output } => {
            commands::build::run(output).await?;
        }
    }

    Ok(())
}
