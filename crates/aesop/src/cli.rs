//! Command-line interface for Aesop.
//!
//! The CLI is the only layer that touches ambient state: it loads the
//! layered TOML configuration, resolves API keys and database URLs from the
//! environment, and injects everything explicitly into the pipeline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Aesop storybook pipeline.
#[derive(Debug, Parser)]
#[command(name = "aesop", version, about = "Generate illustrations and export storybook PDFs")]
pub struct Cli {
    /// Path to a configuration file (defaults to layered aesop.toml lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Pipeline commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate illustrations for every page of a story
    Illustrate {
        /// Story id to illustrate
        story_id: Uuid,
    },
    /// Show a story's status and its latest generation attempt
    Status {
        /// Story id to inspect
        story_id: Uuid,
    },
    /// Assemble the story's PDF, upload it, and record its key
    Export {
        /// Story id to export
        story_id: Uuid,

        /// Also write the PDF to a local file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
