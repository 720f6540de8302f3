//! Prism - multi-tool AI assistant.
//!
//! Main entry point for the Prism CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ask, chat, image, records, speak, video};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Prism - multi-tool AI assistant for chat, image, speech, and video
#[derive(Parser)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (default: platform config dir)
    #[arg(long, global = true, env = "PRISM_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enter interactive chat mode (REPL)
    Chat(chat::ChatArgs),

    /// Ask a one-shot question
    Ask(ask::AskArgs),

    /// Generate an image from a prompt
    Image(image::ImageArgs),

    /// Synthesize speech for a piece of text
    Speak(speak::SpeakArgs),

    /// Generate a short video from a prompt
    Video(video::VideoArgs),

    /// Inspect and manage stored records
    Records(records::RecordsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "prism=debug,prism_chat=debug,prism_gemini=debug,prism_store=debug,prism_config=debug,info"
    } else {
        "prism=info,prism_chat=info,prism_gemini=info,prism_store=info,warn"
    };

    let log_dir = prism_config::config_dir().join("logs");
    let file_appender = tracing_appender::rolling::daily(&log_dir, "prism.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "prism=trace,prism_chat=trace,prism_gemini=trace,prism_store=trace,prism_config=trace,info",
                )),
        )
        .init();

    let config = match cli.config {
        Some(ref path) => prism_config::load_config_from(path)?,
        None => prism_config::load_config()?,
    };

    let ctx = commands::Context {
        config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Image(args) => image::run(args, &ctx).await,
        Commands::Speak(args) => speak::run(args, &ctx).await,
        Commands::Video(args) => video::run(args, &ctx).await,
        Commands::Records(args) => records::run(args, &ctx).await,
    }
}
