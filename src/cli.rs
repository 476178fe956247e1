use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "meetscribe",
    version,
    about = "Asynchronous transcription job orchestrator for meeting audio"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one trigger message (default if no subcommand)
    Handle {
        /// Path to the trigger message JSON (reads stdin if omitted)
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Parse and validate a trigger message without side effects
    Validate {
        /// Path to the trigger message JSON (reads stdin if omitted)
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Write a commented default config file
    InitConfig {
        /// Destination path (defaults to ./meetscribe.toml)
        path: Option<PathBuf>,
    },
}
