//! REPL (Read-Eval-Print Loop) implementation for interactive chat.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use console::{Style, Term, style};
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use prism_chat::{ChatSession, MessageSource, TurnEvent};
use prism_gemini::SharedGateway;
use prism_store::RecordStore;

/// REPL state and configuration.
pub struct Repl {
    session: ChatSession,
    gateway: SharedGateway,
    store: Arc<RecordStore>,
    editor: Editor<(), DefaultHistory>,
    term: Term,
    verbose: bool,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new(gateway: SharedGateway, store: Arc<RecordStore>, verbose: bool) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;
        let session = ChatSession::new(Arc::clone(&gateway), Arc::clone(&store));

        Ok(Self {
            session,
            gateway,
            store,
            editor,
            term: Term::stdout(),
            verbose,
        })
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let prompt = self.format_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_slash_command(line) {
                            Ok(ControlFlow::Continue) => continue,
                            Ok(ControlFlow::Exit) => break,
                            Err(e) => {
                                self.print_error(&format!("Command error: {}", e));
                                continue;
                            }
                        }
                    }

                    if let Err(e) = self.send_message(line).await {
                        self.print_error(&format!("Error: {}", e));
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - cancel current input but don't exit
                    println!();
                    self.print_dim("(Interrupted - type /quit to exit)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(e) => {
                    self.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        self.print_dim("Goodbye!");
        Ok(())
    }

    /// Send a message and stream the response.
    async fn send_message(&mut self, message: &str) -> Result<()> {
        let dim = Style::new().dim();
        let mut stream = self.session.send(message)?;
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
                    println!();
                    self.print_error(&message);
                }
            }
        }

        if !sources.is_empty() {
            println!("{}", dim.apply_to("Sources:"));
            for source in &sources {
                println!("{}", dim.apply_to(format!("  {} - {}", source.title, source.uri)));
            }
        }
        println!();

        Ok(())
    }

    /// Handle a slash command.
    fn handle_slash_command(&mut self, input: &str) -> Result<ControlFlow> {
        let parts: Vec<&str> = input[1..].split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        let args = &parts[1..];

        match cmd {
            "quit" | "q" | "exit" => {
                return Ok(ControlFlow::Exit);
            }
            "help" | "h" | "?" => {
                self.print_help();
            }
            "clear" | "cls" => {
                self.term.clear_screen()?;
            }
            "new" => {
                self.session =
                    ChatSession::new(Arc::clone(&self.gateway), Arc::clone(&self.store));
                self.print_dim("Started a new conversation");
            }
            "records" => {
                let query = args.join(" ");
                self.list_records(&query)?;
            }
            "flush" => {
                self.flush_records()?;
            }
            "" => {
                self.print_dim("Type /help for available commands");
            }
            _ => {
                self.print_error(&format!("Unknown command: /{}", cmd));
                self.print_dim("Type /help for available commands");
            }
        }

        Ok(ControlFlow::Continue)
    }

    fn list_records(&self, query: &str) -> Result<()> {
        let dim = Style::new().dim();
        let records = if query.is_empty() {
            self.store.all()?
        } else {
            self.store.find(query)?
        };

        if records.is_empty() {
            self.print_dim("No records found");
            return Ok(());
        }

        for record in &records {
            println!(
                "{} {} {}",
                dim.apply_to(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
                style(&record.collection).cyan(),
                record.data
            );
        }
        Ok(())
    }

    fn flush_records(&mut self) -> Result<()> {
        let count = self.store.len()?;
        if count == 0 {
            self.print_dim("Store is already empty");
            return Ok(());
        }
        let answer = self
            .editor
            .readline(&format!("Delete all {} records? [y/N] ", count))?;
        if matches!(answer.trim(), "y" | "Y" | "yes") {
            self.store.clear()?;
            let green = Style::new().green();
            println!("{} Deleted {} records", green.apply_to("✓"), count);
        } else {
            self.print_dim("Aborted");
        }
        Ok(())
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Prism Chat").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        if let Some(greeting) = self.session.messages().first() {
            println!("{}", greeting.content);
        }
        println!(
            "{}",
            dim.apply_to("Use /help for commands, Ctrl+D to exit.")
        );
        if self.verbose {
            println!(
                "{}",
                dim.apply_to(format!("Records on file: {}", self.store.len().unwrap_or(0)))
            );
        }
        println!();
    }

    fn print_help(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Available Commands").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {}  - Exit the REPL", style("/quit, /q").cyan());
        println!("  {}  - Show this help", style("/help, /h, /?").cyan());
        println!("  {}  - Clear the screen", style("/clear").cyan());
        println!("  {}  - Start a new conversation", style("/new").cyan());
        println!(
            "  {}  - List stored records (optionally filtered)",
            style("/records [query]").cyan()
        );
        println!(
            "  {}  - Delete every stored record (asks first)",
            style("/flush").cyan()
        );
        println!();
        println!("{}", dim.apply_to("Keyboard shortcuts:"));
        println!("  {} - Interrupt current input", dim.apply_to("Ctrl+C"));
        println!("  {} - Exit the REPL", dim.apply_to("Ctrl+D"));
        println!();
    }

    fn format_prompt(&self) -> String {
        format!("{} ", style("prism>").cyan().bold())
    }

    fn print_dim(&self, msg: &str) {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to(msg));
    }

    fn print_error(&self, msg: &str) {
        let red = Style::new().red();
        println!("{} {}", red.apply_to("Error:"), msg);
    }
}

/// Control flow for the REPL.
pub enum ControlFlow {
    Continue,
    Exit,
}
