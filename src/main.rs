//! Referent CLI entry point.

use anyhow::Result;
use clap::Parser;
use referent::cli::{commands, Cli, Commands};
use referent::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // pick up ASSEMBLYAI_API_KEY / OPENAI_API_KEY from a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("referent={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Transcribe {
            file,
            content_type,
            no_summary,
            output,
        } => {
            commands::run_transcribe(
                file,
                content_type.clone(),
                *no_summary,
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Status { transcript_id } => {
            commands::run_status(transcript_id, settings).await?;
        }

        Commands::Serve {
            host,
            port,
            scripted,
        } => {
            commands::run_serve(host, *port, *scripted, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
