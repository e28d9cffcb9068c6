//! Showreel CLI - Headless Player Tool
//!
//! Features:
//! - Scenario replay against the simulation host
//! - Master playlist inspection
//! - Timestamp formatting
//! - Default configuration dump

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod script;

/// Showreel CLI - Slide-deck video player toolkit
#[derive(Parser)]
#[command(name = "showreel-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Headless replay and inspection for Showreel players", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted interaction scenario
    Replay {
        /// Scenario JSON file
        script: PathBuf,

        /// Player configuration JSON for interactive players
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the renditions of an HLS master playlist
    Levels {
        /// Path to the master playlist
        manifest: PathBuf,
    },

    /// Format seconds as MM:SS
    FormatTime {
        /// Position in seconds
        #[arg(allow_hyphen_values = true)]
        seconds: f64,
    },

    /// Print the default player configurations
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { script, config } => {
            commands::replay(&script, config.as_deref(), &cli.format)?;
        }
        Commands::Levels { manifest } => {
            commands::levels(&manifest, &cli.format)?;
        }
        Commands::FormatTime { seconds } => {
            commands::format_time(seconds, &cli.format)?;
        }
        Commands::Config => {
            commands::config(&cli.format)?;
        }
    }

    Ok(())
}
