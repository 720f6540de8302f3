//! Speak command - speech synthesis to a WAV file.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Args;
use console::Style;

use prism_gemini::{SPEECH_BITS_PER_SAMPLE, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};

use super::Context;

/// Arguments for the speak command.
#[derive(Args, Debug)]
pub struct SpeakArgs {
    /// The text to synthesize
    #[arg(required = true)]
    pub text: String,

    /// Output file
    #[arg(short, long, default_value = "prism-speech.wav")]
    pub out: PathBuf,
}

/// Run the speak command.
pub async fn run(args: SpeakArgs, ctx: &Context) -> Result<()> {
    let gateway = ctx.gateway()?;

    let speech = gateway.generate_speech(&args.text).await?;
    let pcm = BASE64
        .decode(&speech.data)
        .context("speech payload is not valid base64")?;

    std::fs::write(&args.out, wav_bytes(&pcm))
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    let green = Style::new().green();
    let seconds = pcm.len() as f64
        / (SPEECH_SAMPLE_RATE as f64 * SPEECH_CHANNELS as f64 * (SPEECH_BITS_PER_SAMPLE / 8) as f64);
    println!(
        "{} Saved {} ({:.1}s of audio)",
        green.apply_to("✓"),
        args.out.display(),
        seconds
    );

    Ok(())
}

/// Wrap raw PCM in a RIFF/WAVE container using the fixed synthesis format.
fn wav_bytes(pcm: &[u8]) -> Vec<u8> {
    let bytes_per_sample = (SPEECH_BITS_PER_SAMPLE / 8) as u32;
    let byte_rate = SPEECH_SAMPLE_RATE * SPEECH_CHANNELS as u32 * bytes_per_sample;
    let block_align = SPEECH_CHANNELS * (SPEECH_BITS_PER_SAMPLE / 8);
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&SPEECH_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&SPEECH_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&SPEECH_BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
