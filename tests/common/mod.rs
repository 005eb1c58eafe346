// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tabsplit::application::BillService;
use tabsplit::domain::{Ledger, ParticipantId, SettlementEntry, Share};

/// Tolerance for comparing sums of fractional shares, in cents
pub const EPSILON: Share = 1e-6;

/// Helper to create a service with the given people already on the bill
pub fn service_with(people: &[&str]) -> Result<BillService> {
    let mut service = BillService::new();
    for name in people {
        service.add_participant(name)?;
    }
    Ok(service)
}

/// Helper to create a ledger with the given people, returning their ids in order
pub fn ledger_with(people: &[&str]) -> Result<(Ledger, Vec<ParticipantId>)> {
    let mut ledger = Ledger::new();
    let mut ids = Vec::new();
    for name in people {
        ids.push(ledger.add_participant(name)?.id);
    }
    Ok((ledger, ids))
}

/// Find a participant's settlement entry by name
pub fn entry<'a>(settlement: &'a [SettlementEntry], name: &str) -> &'a SettlementEntry {
    settlement
        .iter()
        .find(|e| e.participant == name)
        .unwrap_or_else(|| panic!("no settlement entry for {}", name))
}

pub fn assert_close(actual: Share, expected: Share) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {} but got {}",
        expected,
        actual
    );
}

/// Test fixture: the pizza night bill.
/// Alice and Bob share a 20.00 pizza, Alice alone has a 10.00 salad,
/// plus a 4.00 surcharge.
pub struct PizzaNight;

impl PizzaNight {
    pub fn service() -> Result<BillService> {
        let mut service = service_with(&["Alice", "Bob"])?;
        service.add_item("Pizza", "20")?;
        service.add_item("Salad", "10")?;
        service.assign_all("Pizza")?;
        service.toggle("Salad", "Alice")?;
        service.set_surcharge("4")?;
        Ok(service)
    }
}
