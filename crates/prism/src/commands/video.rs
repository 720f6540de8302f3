//! Video command - long-running video generation with fixed-interval polling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use prism_chat::{ChatError, await_video};
use prism_gemini::{GeminiClient, GeminiConfig, SharedGateway, VideoOperation};

use super::Context;

/// Arguments for the video command.
#[derive(Args, Debug)]
pub struct VideoArgs {
    /// The video prompt
    #[arg(required = true)]
    pub prompt: String,

    /// Download the result to a file instead of printing its URI
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Run the video command.
pub async fn run(args: VideoArgs, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();
    let mut config = GeminiConfig::from_config(&ctx.config)?;
    let mut gateway: SharedGateway = Arc::new(GeminiClient::new(config.clone())?);

    let operation = gateway.start_video(&args.prompt).await?;
    tracing::info!(operation = %operation.name, "video generation started");
    if ctx.verbose {
        println!("{}", dim.apply_to(format!("Operation: {}", operation.name)));
    }

    let interval = Duration::from_secs(ctx.config.video.poll_interval_secs);
    let max_polls = ctx.config.video.max_polls;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    spinner.set_message("Generating video (this can take a few minutes)...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut current = operation;
    let done = loop {
        match await_video(gateway.as_ref(), &current, interval, max_polls).await {
            Ok(done) => break done,
            Err(ChatError::CredentialExpired { operation }) => {
                // The server no longer recognizes the operation under this
                // key. A fresh key lets polling resume where it left off.
                spinner.suspend(|| {
                    println!(
                        "{}",
                        dim.apply_to("The API credential expired while the video was rendering.")
                    );
                });
                let key = spinner
                    .suspend(|| rpassword::prompt_password("Enter a fresh API key: "))
                    .context("failed to read API key")?;
                config.api_key = key;
                gateway = Arc::new(GeminiClient::new(config.clone())?);
                current = VideoOperation::pending(operation);
            }
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        }
    };

    spinner.finish_and_clear();

    let uri = done
        .fetch_uri(&config.api_key)
        .context("completed operation carried no video URI")?;

    let green = Style::new().green();
    match args.out {
        Some(out) => {
            let bytes = reqwest::get(&uri)
                .await
                .context("failed to fetch video")?
                .error_for_status()?
                .bytes()
                .await?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "{} Saved {} ({} bytes)",
                green.apply_to("✓"),
                out.display(),
                bytes.len()
            );
        }
        None => {
            println!("{} Video ready:", green.apply_to("✓"));
            println!("{}", uri);
        }
    }

    Ok(())
}
