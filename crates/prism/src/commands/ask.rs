//! Ask command - one-shot question to the assistant.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use console::Style;
use futures::StreamExt;

use prism_chat::{ChatSession, MessageSource, TurnEvent};

use super::Context;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question or prompt to send
    #[arg(required = true)]
    pub prompt: String,

    /// Print grounding sources after the answer
    #[arg(long)]
    pub sources: bool,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();
    let session = ChatSession::new(ctx.gateway()?, ctx.store());

    let mut stream = session.send(&args.prompt)?;
    let mut sources: Vec<MessageSource> = Vec::new();
    let mut has_output = false;

    while let Some(event) = stream.next().await {
        match event {
            TurnEvent::Text { content } => {
                print!("{}", content);
                std::io::stdout().flush()?;
                has_output = true;
            }
            TurnEvent::ToolStatus { status, .. } => {
                if has_output {
                    println!();
                }
                println!("{}", dim.apply_to(format!("[memory: {}]", status)));
                has_output = false;
            }
            TurnEvent::Sources { added } => {
                sources.extend(added);
            }
            TurnEvent::Done => {
                if has_output {
                    println!();
                }
            }
            TurnEvent::Error { message } => {
                let red = Style::new().red();
                eprintln!();
                eprintln!("{} {}", red.apply_to("Error:"), message);
                return Err(anyhow::anyhow!(message));
            }
        }
    }

    if args.sources && !sources.is_empty() {
        println!("{}", dim.apply_to("Sources:"));
        for source in &sources {
            println!(
                "{}",
                dim.apply_to(format!("  {} - {}", source.title, source.uri))
            );
        }
    }

    Ok(())
}
