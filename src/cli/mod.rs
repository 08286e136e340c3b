//! CLI module for Referent.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Referent - Transcription and Summarization Relay
///
/// Relays audio to a hosted transcription provider, polls for the transcript,
/// and optionally condenses it with an LLM summarizer.
#[derive(Parser, Debug)]
#[command(name = "referent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check credentials and configuration
    Doctor,

    /// Transcribe a local audio file and print or save the result
    Transcribe {
        /// Path to the audio file
        file: String,

        /// Content type sent to the provider (guessed from the extension by default)
        #[arg(long)]
        content_type: Option<String>,

        /// Skip summarization for this run
        #[arg(long)]
        no_summary: bool,

        /// Write the result as JSON to a file ('-' for stdout) instead of printing
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check one job's status with a single provider read
    Status {
        /// Provider-assigned transcript id
        transcript_id: String,
    },

    /// Start the HTTP/WebSocket server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Serve canned transcripts without provider credentials (for demos and tests)
        #[arg(long)]
        scripted: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
