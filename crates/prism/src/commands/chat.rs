//! Chat command - interactive REPL mode.

use anyhow::Result;
use clap::Args;

use super::Context;
use super::repl::Repl;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {}

/// Run the chat command (REPL).
pub async fn run(_args: ChatArgs, ctx: &Context) -> Result<()> {
    let gateway = ctx.gateway()?;
    let store = ctx.store();

    let mut repl = Repl::new(gateway, store, ctx.verbose)?;
    repl.run().await
}
