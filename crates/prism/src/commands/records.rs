//! Records command - inspect and manage the on-disk record store.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};

use prism_store::Record;

use super::Context;

/// Arguments for the records command.
#[derive(Args, Debug)]
pub struct RecordsArgs {
    #[command(subcommand)]
    pub command: Option<RecordsCommand>,
}

/// Record store operations.
#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    /// List all records in insertion order
    List {
        /// Only show records from this collection
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Find records whose collection or content matches a query
    Find {
        /// Case-insensitive substring to search for
        query: String,
    },

    /// List collection names in first-seen order
    Collections,

    /// Delete every stored record
    Flush {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Run the records command.
pub async fn run(args: RecordsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store();

    match args.command.unwrap_or(RecordsCommand::List { collection: None }) {
        RecordsCommand::List { collection } => {
            let records = store.all()?;
            let filtered: Vec<&Record> = records
                .iter()
                .filter(|r| collection.as_deref().is_none_or(|c| r.collection == c))
                .collect();
            print_records(&filtered);
        }
        RecordsCommand::Find { query } => {
            let records = store.find(&query)?;
            let found: Vec<&Record> = records.iter().collect();
            print_records(&found);
        }
        RecordsCommand::Collections => {
            let collections = store.collections()?;
            if collections.is_empty() {
                print_dim("No collections");
            } else {
                for name in collections {
                    println!("{}", name);
                }
            }
        }
        RecordsCommand::Flush { yes } => {
            let count = store.len()?;
            if count == 0 {
                print_dim("Store is already empty");
                return Ok(());
            }
            if !yes && !confirm(&format!("Delete all {} records?", count))? {
                print_dim("Aborted");
                return Ok(());
            }
            store.clear()?;
            let green = Style::new().green();
            println!("{} Deleted {} records", green.apply_to("✓"), count);
        }
    }

    Ok(())
}

fn print_records(records: &[&Record]) {
    if records.is_empty() {
        print_dim("No records found");
        return;
    }
    let dim = Style::new().dim();
    for record in records {
        println!(
            "{} {} {}",
            dim.apply_to(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
            style(&record.collection).cyan(),
            record.data
        );
    }
}

fn print_dim(msg: &str) {
    let dim = Style::new().dim();
    println!("{}", dim.apply_to(msg));
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
