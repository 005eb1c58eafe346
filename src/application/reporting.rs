use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{equal_share, Cents, ItemId, Ledger, SettlementEntry, Share};

/// Tip percentages offered alongside a settlement. Informational only: tips
/// are never added to anyone's total.
pub const TIP_PERCENTAGES: [u32; 3] = [15, 18, 20];

/// A settlement together with the bill-level figures a front end shows
/// next to it.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<SettlementEntry>,
    /// Sum of all item amounts, shared or not
    pub item_total: Cents,
    pub surcharge: Cents,
    /// Items plus surcharge
    pub bill_total: Cents,
    /// Amount of items that at least one participant shares
    pub allocated: Cents,
    /// Amount of items nobody shares; charged to no one
    pub unallocated: Cents,
    pub unallocated_items: Vec<UnallocatedItem>,
    /// Each participant's part of the surcharge (None without participants)
    pub surcharge_share: Option<Share>,
    /// Bill total divided by headcount (None without participants)
    pub average_per_participant: Option<Share>,
    pub tip_suggestions: Vec<TipSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnallocatedItem {
    pub item_id: ItemId,
    pub name: String,
    pub amount_cents: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSuggestion {
    pub percent: u32,
    pub amount_cents: Cents,
}

impl SettlementReport {
    /// Build a report from the current state of the ledger.
    pub fn from_ledger(ledger: &Ledger, generated_at: DateTime<Utc>) -> Self {
        let items = ledger.items();
        let headcount = ledger.participants().len();

        let item_total = ledger.item_total();
        let unallocated_items: Vec<UnallocatedItem> = items
            .iter()
            .filter(|i| i.is_unassigned())
            .map(|i| UnallocatedItem {
                item_id: i.id,
                name: i.name.clone(),
                amount_cents: i.amount_cents,
            })
            .collect();
        let unallocated: Cents = unallocated_items.iter().map(|i| i.amount_cents).sum();
        let bill_total = ledger.bill_total();

        Self {
            generated_at,
            entries: ledger.compute_settlement(),
            item_total,
            surcharge: ledger.surcharge(),
            bill_total,
            allocated: item_total - unallocated,
            unallocated,
            unallocated_items,
            surcharge_share: equal_share(ledger.surcharge(), headcount),
            average_per_participant: equal_share(bill_total, headcount),
            tip_suggestions: tip_suggestions(bill_total),
        }
    }

    /// Sum of every participant's total, i.e. the part of the bill that is
    /// actually charged to someone.
    pub fn total_owed(&self) -> Share {
        self.entries.iter().map(|e| e.total_owed).sum()
    }

    pub fn has_unallocated(&self) -> bool {
        !self.unallocated_items.is_empty()
    }
}

/// Suggested tips on a bill total, rounded to the cent.
pub fn tip_suggestions(bill_total: Cents) -> Vec<TipSuggestion> {
    TIP_PERCENTAGES
        .iter()
        .map(|&percent| TipSuggestion {
            percent,
            amount_cents: (bill_total as f64 * percent as f64 / 100.0).round() as Cents,
        })
        .collect()
}
