mod session;

pub use session::{Flow, Session};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{stdin, stdout, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::application::{BillService, SettlementReport};
use crate::domain::{format_cents, format_share, Cents, Share};
use crate::io::{Exporter, ImportOptions, ImportResult, Importer};

/// tabsplit - split a shared bill item by item
#[derive(Parser)]
#[command(name = "tabsplit")]
#[command(about = "Split a shared bill: who had what, plus a flat surcharge shared by everyone")]
#[command(version)]
pub struct Cli {
    /// Currency symbol printed in front of amounts (e.g. "$", "₹")
    #[arg(long, global = true, env = "TABSPLIT_CURRENCY", default_value = "")]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a bill described in a file (JSON snapshot, or CSV with name,amount,shared_by)
    Split {
        /// Bill file; CSV if the extension is .csv, JSON otherwise
        file: PathBuf,

        /// Output format: table, json, csv
        #[arg(short, long, default_value = "table")]
        format: String,

        /// People at the table, added before the file is read (comma-separated)
        #[arg(long, value_delimiter = ',')]
        people: Vec<String>,

        /// Flat surcharge (tax, service) split evenly; overrides the file
        #[arg(long, allow_hyphen_values = true)]
        surcharge: Option<String>,

        /// Add people named in shared_by who are not on the bill yet
        #[arg(long)]
        create_people: bool,
    },

    /// Start an interactive session (nothing is saved when it ends)
    Session {
        /// Share every new item with everyone already on the bill
        #[arg(long)]
        quick_add: bool,
    },
}

impl Cli {
    /// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
    pub fn init_logging(&self) {
        let default_directive = if self.verbose {
            "tabsplit=debug"
        } else {
            "tabsplit=error"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Split {
                file,
                format,
                people,
                surcharge,
                create_people,
            } => {
                let service = load_bill(&file, &people, surcharge.as_deref(), create_people)?;
                let mut out = stdout().lock();
                write_settlement(&mut out, &service, &format, &self.currency)?;
            }

            Commands::Session { quick_add } => {
                let service = BillService::new().with_quick_add(quick_add);
                let mut session = Session::new(service, self.currency);
                session.run(stdin().lock(), stdout().lock())?;
            }
        }

        Ok(())
    }
}

/// Build a bill from a file, reporting rejected rows on stderr.
pub fn load_bill(
    path: &Path,
    people: &[String],
    surcharge: Option<&str>,
    create_people: bool,
) -> Result<BillService> {
    let mut service = BillService::new();
    for name in people.iter().filter(|n| !n.trim().is_empty()) {
        service
            .add_participant(name)
            .with_context(|| format!("Invalid participant name '{}'", name))?;
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open bill file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let options = ImportOptions {
        create_missing_participants: create_people,
    };

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let mut importer = Importer::new(&mut service);
    let result = if is_csv {
        importer.import_items_csv(reader, options)?
    } else {
        importer
            .import_snapshot_json(reader, options)
            .with_context(|| format!("Failed to read bill snapshot: {}", path.display()))?
    };
    report_import_errors(&result);

    if let Some(amount) = surcharge {
        service
            .set_surcharge(amount)
            .context("Invalid surcharge")?;
    }

    Ok(service)
}

fn report_import_errors(result: &ImportResult) {
    if result.errors.is_empty() {
        return;
    }

    eprintln!("Skipped {} invalid entries:", result.errors.len());
    for error in result.errors.iter().take(10) {
        eprintln!(
            "  Line {}: {}",
            error.line,
            error
                .field
                .as_ref()
                .map(|f| format!("{}: ", f))
                .unwrap_or_default()
                + &error.error
        );
    }
    if result.errors.len() > 10 {
        eprintln!("  ... and {} more errors", result.errors.len() - 10);
    }
}

/// Write the current settlement in the requested format: table, json, csv.
pub fn write_settlement<W: Write>(
    out: &mut W,
    service: &BillService,
    format: &str,
    currency: &str,
) -> Result<()> {
    match format {
        "table" => render_report(out, &service.report(), currency)?,
        "json" => {
            Exporter::new(service).export_settlement_json(&mut *out)?;
            writeln!(out)?;
        }
        "csv" => {
            Exporter::new(service).export_settlement_csv(&mut *out)?;
        }
        _ => anyhow::bail!(
            "Invalid format '{}'. Valid formats: table, json, csv",
            format
        ),
    }
    Ok(())
}

/// Render a settlement as a human-readable table.
pub fn render_report<W: Write>(
    out: &mut W,
    report: &SettlementReport,
    currency: &str,
) -> std::io::Result<()> {
    if report.entries.is_empty() {
        writeln!(out, "Nobody is on the bill yet.")?;
        return Ok(());
    }

    writeln!(out, "{:<24} {:>12}", "PARTICIPANT", "OWES")?;
    writeln!(out, "{}", "-".repeat(37))?;
    for entry in &report.entries {
        writeln!(
            out,
            "{:<24} {:>12}",
            truncate(&entry.participant, 24),
            share(currency, entry.total_owed)
        )?;
        for line in &entry.line_items {
            writeln!(
                out,
                "  {:<22} {:>12}",
                truncate(&line.item_name, 22),
                share(currency, line.share)
            )?;
        }
        if report.surcharge > 0 {
            writeln!(
                out,
                "  {:<22} {:>12}",
                "surcharge",
                share(currency, entry.surcharge_share)
            )?;
        }
    }
    writeln!(out, "{}", "-".repeat(37))?;

    writeln!(
        out,
        "Bill total:  {} (items {} + surcharge {})",
        money(currency, report.bill_total),
        money(currency, report.item_total),
        money(currency, report.surcharge)
    )?;
    if let Some(average) = report.average_per_participant {
        writeln!(out, "Per person average: {}", share(currency, average))?;
    }
    if report.has_unallocated() {
        let names: Vec<String> = report
            .unallocated_items
            .iter()
            .map(|i| format!("{} {}", i.name, money(currency, i.amount_cents)))
            .collect();
        writeln!(
            out,
            "Not shared by anyone (charged to nobody): {} [{}]",
            money(currency, report.unallocated),
            names.join(", ")
        )?;
    }
    let tips: Vec<String> = report
        .tip_suggestions
        .iter()
        .map(|t| format!("{}% {}", t.percent, money(currency, t.amount_cents)))
        .collect();
    writeln!(out, "Tip suggestions: {}", tips.join(" | "))?;

    Ok(())
}

fn money(currency: &str, cents: Cents) -> String {
    format!("{}{}", currency, format_cents(cents))
}

fn share(currency: &str, share: Share) -> String {
    format!("{}{}", currency, format_share(share))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_split() {
        let cli = Cli::try_parse_from([
            "tabsplit",
            "split",
            "bill.csv",
            "--people",
            "Alice,Bob",
            "--surcharge",
            "4",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Split {
                file,
                format,
                people,
                surcharge,
                create_people,
            } => {
                assert_eq!(file, PathBuf::from("bill.csv"));
                assert_eq!(format, "json");
                assert_eq!(people, vec!["Alice", "Bob"]);
                assert_eq!(surcharge.as_deref(), Some("4"));
                assert!(!create_people);
            }
            Commands::Session { .. } => panic!("expected split"),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pizza", 10), "Pizza");
        assert_eq!(truncate("Margherita pizza", 10), "Margher...");
    }

    #[test]
    fn test_render_empty_report() {
        let service = BillService::new();
        let mut out = Vec::new();

        render_report(&mut out, &service.report(), "").unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Nobody is on the bill yet.\n");
    }

    #[test]
    fn test_write_settlement_rejects_unknown_format() {
        let service = BillService::new();
        let mut out = Vec::new();

        assert!(write_settlement(&mut out, &service, "xml", "").is_err());
    }
}
