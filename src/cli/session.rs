use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::application::BillService;
use crate::domain::format_cents;
use crate::io::Exporter;

use super::write_settlement;

/// One line typed during a session
#[derive(Parser)]
#[command(name = "tabsplit", no_binary_name = true)]
#[command(disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Add or remove people
    #[command(subcommand, alias = "people")]
    Person(PersonCommand),

    /// Add or remove items
    #[command(subcommand, alias = "items")]
    Item(ItemCommand),

    /// Flip whether someone shared an item
    Toggle {
        /// Item name, number or id
        item: String,
        /// Person name, number or id
        person: String,
    },

    /// Share an item with everyone currently on the bill
    All {
        /// Item name, number or id
        item: String,
    },

    /// Set the flat surcharge (tax, service) split evenly across everyone
    Surcharge {
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Turn quick-add mode on or off (new items shared with everyone)
    QuickAdd {
        /// on or off
        state: String,
    },

    /// Show people, items and the surcharge
    #[command(alias = "ls")]
    List,

    /// Show what everyone owes
    Split {
        /// Output format: table, json, csv
        #[arg(default_value = "table")]
        format: String,
    },

    /// Write the bill or its settlement to a file
    Export {
        /// What to export: snapshot, json, csv
        kind: String,
        /// Output file
        path: PathBuf,
    },

    /// Start over with an empty bill
    Clear,

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand)]
enum PersonCommand {
    /// Add a person
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Remove a person and take them off every item
    #[command(alias = "remove")]
    Rm {
        /// Person name, number or id
        person: String,
    },
}

#[derive(Subcommand)]
enum ItemCommand {
    /// Add an item: a name followed by its amount, e.g. `item add Garlic bread 4.50`
    Add {
        #[arg(required = true, num_args = 2.., allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Add an item from a spoken phrase, e.g. `item say pizza $15`
    Say {
        #[arg(required = true, allow_hyphen_values = true)]
        phrase: Vec<String>,
    },
    /// Remove an item
    #[command(alias = "remove")]
    Rm {
        /// Item name, number or id
        item: String,
    },
}

/// Whether the session should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// An interactive, in-memory bill-splitting session.
/// Rejected input is reported and the session carries on; only failing to
/// read input or write output ends it early.
pub struct Session {
    service: BillService,
    currency: String,
}

impl Session {
    pub fn new(service: BillService, currency: impl Into<String>) -> Self {
        Self {
            service,
            currency: currency.into(),
        }
    }

    pub fn service(&self) -> &BillService {
        &self.service
    }

    /// Read commands line by line until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        writeln!(output, "tabsplit session. Type 'help' for commands, 'quit' to leave.")?;
        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            if self.execute(&line, &mut output)? == Flow::Quit {
                break;
            }
        }
        output.flush()?;
        Ok(())
    }

    /// Execute one line of input.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let words = match split_words(line) {
            Ok(words) if words.is_empty() => return Ok(Flow::Continue),
            Ok(words) => words,
            Err(message) => {
                writeln!(out, "error: {}", message)?;
                return Ok(Flow::Continue);
            }
        };

        let command = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // Also covers `help`, which clap reports as an "error"
                write!(out, "{}", err)?;
                return Ok(Flow::Continue);
            }
        };

        match self.dispatch(command, out) {
            Ok(flow) => Ok(flow),
            Err(err) => {
                // If reporting the error fails too, that error ends the session
                writeln!(out, "error: {:#}", err)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<Flow> {
        let currency = self.currency.clone();

        match command {
            SessionCommand::Person(PersonCommand::Add { name }) => {
                let participant = self.service.add_participant(&name.join(" "))?;
                writeln!(out, "Added {}", participant.name)?;
            }

            SessionCommand::Person(PersonCommand::Rm { person }) => {
                match self.service.remove_participant(&person) {
                    Some(removed) => writeln!(out, "Removed {}", removed.name)?,
                    None => writeln!(out, "Nobody called '{}' on the bill", person)?,
                }
            }

            SessionCommand::Item(ItemCommand::Add { mut words }) => {
                let amount = words.pop().unwrap_or_default();
                let item = self.service.add_item(&words.join(" "), &amount)?;
                writeln!(
                    out,
                    "Added {} {}{}{}",
                    item.name,
                    currency,
                    format_cents(item.amount_cents),
                    self.shared_note(item.participants().len())
                )?;
            }

            SessionCommand::Item(ItemCommand::Say { phrase }) => {
                let item = self.service.add_item_from_phrase(&phrase.join(" "))?;
                writeln!(
                    out,
                    "Added {} {}{}{}",
                    item.name,
                    currency,
                    format_cents(item.amount_cents),
                    self.shared_note(item.participants().len())
                )?;
            }

            SessionCommand::Item(ItemCommand::Rm { item }) => {
                match self.service.remove_item(&item) {
                    Some(removed) => writeln!(out, "Removed {}", removed.name)?,
                    None => writeln!(out, "No item '{}' on the bill", item)?,
                }
            }

            SessionCommand::Toggle { item, person } => {
                let result = self.service.toggle(&item, &person)?;
                let verb = if result.sharing { "now shares" } else { "no longer shares" };
                writeln!(out, "{} {} {}", result.participant_name, verb, result.item_name)?;
            }

            SessionCommand::All { item } => {
                let item = self.service.assign_all(&item)?;
                writeln!(
                    out,
                    "{} is shared by everyone ({})",
                    item.name,
                    item.participants().len()
                )?;
            }

            SessionCommand::Surcharge { amount } => {
                let cents = self.service.set_surcharge(&amount)?;
                writeln!(out, "Surcharge set to {}{}", currency, format_cents(cents))?;
            }

            SessionCommand::QuickAdd { state } => {
                let enabled = match state.to_lowercase().as_str() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => anyhow::bail!("Invalid state '{}'. Use on or off", state),
                };
                self.service.set_quick_add(enabled);
                writeln!(
                    out,
                    "Quick-add {}",
                    if enabled { "on: new items are shared with everyone" } else { "off" }
                )?;
            }

            SessionCommand::List => self.list(out)?,

            SessionCommand::Split { format } => {
                write_settlement(out, &self.service, &format, &currency)?;
            }

            SessionCommand::Export { kind, path } => {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                let exporter = Exporter::new(&self.service);
                match kind.as_str() {
                    "snapshot" => {
                        exporter.export_snapshot_json(file)?;
                    }
                    "json" => {
                        exporter.export_settlement_json(file)?;
                    }
                    "csv" => {
                        exporter.export_settlement_csv(file)?;
                    }
                    _ => anyhow::bail!(
                        "Invalid export type '{}'. Valid types: snapshot, json, csv",
                        kind
                    ),
                }
                writeln!(out, "Exported {} to {}", kind, path.display())?;
            }

            SessionCommand::Clear => {
                self.service.clear();
                writeln!(out, "Cleared the bill")?;
            }

            SessionCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        let ledger = self.service.ledger();

        writeln!(out, "People:")?;
        if ledger.participants().is_empty() {
            writeln!(out, "  (none)")?;
        }
        for (i, participant) in ledger.participants().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, participant.name)?;
        }

        writeln!(out, "Items:")?;
        if ledger.items().is_empty() {
            writeln!(out, "  (none)")?;
        }
        for (i, item) in ledger.items().iter().enumerate() {
            let sharers: Vec<&str> = item
                .participants()
                .iter()
                .filter_map(|id| ledger.participant(*id))
                .map(|p| p.name.as_str())
                .collect();
            writeln!(
                out,
                "  {}. {} {}{} [{}]",
                i + 1,
                item.name,
                self.currency,
                format_cents(item.amount_cents),
                if sharers.is_empty() {
                    "nobody".to_string()
                } else {
                    sharers.join(", ")
                }
            )?;
        }

        writeln!(
            out,
            "Surcharge: {}{}",
            self.currency,
            format_cents(ledger.surcharge())
        )?;
        writeln!(
            out,
            "Quick-add: {}",
            if self.service.quick_add() { "on" } else { "off" }
        )?;
        Ok(())
    }

    fn shared_note(&self, sharers: usize) -> String {
        if sharers > 0 {
            format!(" (shared by {})", sharers)
        } else {
            String::new()
        }
    }
}

/// Split a line into words, keeping "quoted phrases" together.
fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
