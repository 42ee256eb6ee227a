//! CLI parse: clap types for Storyloom. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storyloom CLI - personalized children's stories
#[derive(Parser)]
#[command(name = "storyloom")]
#[command(about = "Generate, score and inspect personalized children's stories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working directory holding config/config.toml
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Configuration file path (overrides layered config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a story from a JSON request file
    Generate {
        /// Request body (childName, childAge, storyLength, themes, ...)
        #[arg(long)]
        request: PathBuf,
        /// Fixed seed for placeholder-name selection
        #[arg(long)]
        seed: Option<u64>,
        /// Also generate a cover illustration
        #[arg(long)]
        illustrate: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the length and content policy tables
    Policy {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Score a saved story against a request without calling a model
    Score {
        /// Request body the story was written for
        #[arg(long)]
        request: PathBuf,
        /// Raw story text file
        #[arg(long)]
        story: PathBuf,
        /// Character name to look for (defaults to the name the request resolves to)
        #[arg(long)]
        character: Option<String>,
        /// Fixed seed for placeholder-name selection
        #[arg(long)]
        seed: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Commands {
    /// Stable command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Policy { .. } => "policy",
            Commands::Score { .. } => "score",
        }
    }
}
