use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use tracing::warn;

use crate::application::{BillService, SettlementReport};
use crate::domain::{format_cents, format_share};

/// A bill described by names rather than ids, for export and import.
/// Hand-written files may leave out `version`, `exported_at` and `surcharge`.
///
/// Sharers are matched by name on import, first match wins. When two people
/// have the same name, everything either of them shared lands on the first
/// one after a round trip; see [`BillSnapshot::duplicate_names`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillSnapshot {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
    #[serde(default)]
    pub surcharge: Option<SnapshotAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub name: String,
    pub amount: SnapshotAmount,
    /// Names of the participants sharing the item
    #[serde(default)]
    pub shared_by: Vec<String>,
}

/// An amount written either as a decimal string ("12.50") or a JSON number (12.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotAmount {
    Number(serde_json::Number),
    Text(String),
}

impl SnapshotAmount {
    pub fn as_text(&self) -> String {
        match self {
            SnapshotAmount::Number(n) => n.to_string(),
            SnapshotAmount::Text(s) => s.clone(),
        }
    }
}

impl BillSnapshot {
    /// Describe the bill currently held by the service.
    pub fn from_service(service: &BillService) -> Self {
        let ledger = service.ledger();
        let name_of = |id| {
            ledger
                .participant(id)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        };

        let snapshot = Self {
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            exported_at: Some(Utc::now()),
            participants: ledger.participants().iter().map(|p| p.name.clone()).collect(),
            items: ledger
                .items()
                .iter()
                .map(|item| SnapshotItem {
                    name: item.name.clone(),
                    amount: SnapshotAmount::Text(format_cents(item.amount_cents)),
                    shared_by: item.participants().iter().map(|id| name_of(*id)).collect(),
                })
                .collect(),
            surcharge: Some(SnapshotAmount::Text(format_cents(ledger.surcharge()))),
        };

        let duplicates = snapshot.duplicate_names();
        if !duplicates.is_empty() {
            warn!(
                names = ?duplicates,
                "participants share a name; their items merge on re-import"
            );
        }
        snapshot
    }

    /// Participant names that appear more than once (case-insensitive),
    /// in the order their second occurrence is listed.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.participants
            .iter()
            .filter(|name| !seen.insert(name.trim().to_lowercase()))
            .cloned()
            .collect()
    }
}

/// Exporter for writing bills and settlements in various formats
pub struct Exporter<'a> {
    service: &'a BillService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BillService) -> Self {
        Self { service }
    }

    /// Export the settlement as CSV: one row per line item, then a surcharge
    /// row (if any) and a total row for each participant.
    /// Returns the number of participants written.
    pub fn export_settlement_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let report = self.service.report();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["participant", "item", "share"])?;

        for entry in &report.entries {
            for line in &entry.line_items {
                csv_writer.write_record([
                    entry.participant.as_str(),
                    line.item_name.as_str(),
                    format_share(line.share).as_str(),
                ])?;
            }
            if report.surcharge > 0 {
                csv_writer.write_record([
                    entry.participant.as_str(),
                    "surcharge",
                    format_share(entry.surcharge_share).as_str(),
                ])?;
            }
            csv_writer.write_record([
                entry.participant.as_str(),
                "total",
                format_share(entry.total_owed).as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.entries.len())
    }

    /// Export the full settlement report as JSON
    pub fn export_settlement_json<W: Write>(&self, mut writer: W) -> Result<SettlementReport> {
        let report = self.service.report();

        let json = serde_json::to_string_pretty(&report)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(report)
    }

    /// Export the bill itself as a JSON snapshot that can be split again later
    pub fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<BillSnapshot> {
        let snapshot = BillSnapshot::from_service(self.service);

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
