use anyhow::Result;
use std::io::Read;

use crate::application::BillService;
use crate::domain::ItemId;
use crate::io::export::BillSnapshot;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub participants: usize,
    pub items: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    /// CSV line, or 1-based item position in a JSON snapshot (0 for bill-level fields)
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Add people named in `shared_by` who are not on the bill yet
    pub create_missing_participants: bool,
}

/// Importer for loading a bill into a session. Every value goes through the
/// same validation as typed input; rejected rows are reported, not fatal.
pub struct Importer<'a> {
    service: &'a mut BillService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a mut BillService) -> Self {
        Self { service }
    }

    /// Import a bill from a JSON snapshot
    pub fn import_snapshot_json<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let snapshot: BillSnapshot = serde_json::from_reader(reader)?;
        let mut result = ImportResult::default();

        for name in &snapshot.participants {
            match self.service.add_participant(name) {
                Ok(_) => result.participants += 1,
                Err(e) => result.errors.push(ImportError {
                    line: 0,
                    field: Some("participants".to_string()),
                    error: e.to_string(),
                }),
            }
        }

        for (index, item) in snapshot.items.iter().enumerate() {
            let line = index + 1;
            let added = match self.service.add_item(&item.name, &item.amount.as_text()) {
                Ok(added) => added,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            result.items += 1;

            for name in &item.shared_by {
                if let Err(error) = self.share(added.id, name, &options, &mut result) {
                    result.errors.push(ImportError {
                        line,
                        field: Some("shared_by".to_string()),
                        error,
                    });
                }
            }
        }

        if let Some(surcharge) = &snapshot.surcharge {
            if let Err(e) = self.service.set_surcharge(&surcharge.as_text()) {
                result.errors.push(ImportError {
                    line: 0,
                    field: Some("surcharge".to_string()),
                    error: e.to_string(),
                });
            }
        }

        Ok(result)
    }

    /// Import items from CSV with the columns `name,amount,shared_by`, where
    /// `shared_by` is a `;`-separated list of names.
    pub fn import_items_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, record) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let name = record.get(0).unwrap_or("");
            let amount = record.get(1).unwrap_or("");
            let shared_by = record.get(2).unwrap_or("");

            let added = match self.service.add_item(name, amount) {
                Ok(added) => added,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some(if e.is_invalid_input() && !name.trim().is_empty() {
                            "amount".to_string()
                        } else {
                            "name".to_string()
                        }),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            result.items += 1;

            for sharer in shared_by.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                if let Err(error) = self.share(added.id, sharer, &options, &mut result) {
                    result.errors.push(ImportError {
                        line,
                        field: Some("shared_by".to_string()),
                        error,
                    });
                }
            }
        }

        Ok(result)
    }

    /// Make `name` share the item, adding them to the bill if allowed.
    /// Naming someone twice for the same item keeps them sharing it once.
    fn share(
        &mut self,
        item_id: ItemId,
        name: &str,
        options: &ImportOptions,
        result: &mut ImportResult,
    ) -> std::result::Result<(), String> {
        let participant_id = match self.service.find_participant_by_name(name) {
            Some(p) => p.id,
            None if options.create_missing_participants => {
                let added = self
                    .service
                    .add_participant(name)
                    .map_err(|e| e.to_string())?;
                result.participants += 1;
                added.id
            }
            None => return Err(format!("Unknown participant '{}'", name)),
        };

        let already_sharing = self
            .service
            .ledger()
            .item(item_id)
            .is_some_and(|item| item.is_shared_by(participant_id));
        if !already_sharing {
            self.service
                .toggle(&item_id.to_string(), &participant_id.to_string())
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_items_csv() {
        let mut service = BillService::new();
        service.add_participant("Alice").unwrap();
        service.add_participant("Bob").unwrap();
        let csv = "name,amount,shared_by\n\
                   Pizza,20,Alice;Bob\n\
                   Salad,10.00,alice\n\
                   Coffee,9,\n";

        let result = Importer::new(&mut service)
            .import_items_csv(csv.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.items, 3);
        assert!(result.errors.is_empty());
        let report = service.report();
        assert_eq!(report.entries[0].total_owed, 2000.0);
        assert_eq!(report.entries[1].total_owed, 1000.0);
        assert_eq!(report.unallocated, 900);
    }

    #[test]
    fn test_import_items_csv_reports_bad_rows() {
        let mut service = BillService::new();
        let csv = "name,amount,shared_by\n\
                   Pizza,abc,\n\
                   Water,0,\n\
                   ,5,\n\
                   Salad,10,Zed\n";

        let result = Importer::new(&mut service)
            .import_items_csv(csv.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.items, 1);
        assert_eq!(result.errors.len(), 4);
        assert_eq!(result.errors[0].line, 2);
        assert_eq!(result.errors[0].field.as_deref(), Some("amount"));
        assert_eq!(result.errors[2].field.as_deref(), Some("name"));
        assert_eq!(result.errors[3].field.as_deref(), Some("shared_by"));
        assert_eq!(service.ledger().items().len(), 1);
    }

    #[test]
    fn test_import_creates_missing_participants_once() {
        let mut service = BillService::new();
        let csv = "name,amount,shared_by\nPizza,20,Alice;Bob;Alice\n";
        let options = ImportOptions {
            create_missing_participants: true,
        };

        let result = Importer::new(&mut service)
            .import_items_csv(csv.as_bytes(), options)
            .unwrap();

        assert_eq!(result.participants, 2);
        assert_eq!(service.ledger().items()[0].participants().len(), 2);
    }

    #[test]
    fn test_import_sharers_match_names_only() {
        let mut service = BillService::new();
        let alice = service.add_participant("Alice").unwrap();
        service.add_participant("Bob").unwrap();
        let csv = format!("name,amount,shared_by\nPizza,20,2\nSalad,10,{}\n", alice.id);

        let result = Importer::new(&mut service)
            .import_items_csv(csv.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.items, 2);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].error.contains("Unknown participant '2'"));
        assert_eq!(result.errors[0].field.as_deref(), Some("shared_by"));
        assert!(service.ledger().items().iter().all(|i| i.is_unassigned()));
    }
}
