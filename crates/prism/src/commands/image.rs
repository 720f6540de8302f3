//! Image command - single-shot image generation.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Args, ValueEnum};
use console::Style;

use prism_gemini::AspectRatio;

use super::Context;

/// Arguments for the image command.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// The image prompt
    #[arg(required = true)]
    pub prompt: String,

    /// Output aspect ratio
    #[arg(short, long, value_enum, default_value = "square")]
    pub aspect_ratio: Ratio,

    /// Output file (extension inferred from the response when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// CLI-facing aspect ratio names.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Ratio {
    /// 1:1
    Square,
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
}

impl From<Ratio> for AspectRatio {
    fn from(ratio: Ratio) -> Self {
        match ratio {
            Ratio::Square => AspectRatio::Square,
            Ratio::Landscape => AspectRatio::Landscape,
            Ratio::Portrait => AspectRatio::Portrait,
        }
    }
}

/// Run the image command.
pub async fn run(args: ImageArgs, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();
    let gateway = ctx.gateway()?;

    if ctx.verbose {
        println!(
            "{}",
            dim.apply_to(format!(
                "Generating {} image: {}",
                AspectRatio::from(args.aspect_ratio),
                args.prompt
            ))
        );
    }

    let image = gateway
        .generate_image(&args.prompt, args.aspect_ratio.into())
        .await?;
    tracing::debug!(mime_type = %image.mime_type, "image generated");

    let bytes = BASE64
        .decode(&image.data)
        .context("image payload is not valid base64")?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("prism-image.{}", extension(&image.mime_type))));
    std::fs::write(&out, &bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;

    let green = Style::new().green();
    println!(
        "{} Saved {} ({} bytes, {})",
        green.apply_to("✓"),
        out.display(),
        bytes.len(),
        image.mime_type
    );

    Ok(())
}

/// File extension for a reported MIME type.
fn extension(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_mime_type() {
        assert_eq!(extension("image/png"), "png");
        assert_eq!(extension("image/jpeg"), "jpg");
        assert_eq!(extension("application/octet-stream"), "png");
    }
}
