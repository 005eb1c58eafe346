use std::collections::HashMap;

use serde::Serialize;

use super::{Cents, Item, ItemId, Participant, ParticipantId, Share};

/// One participant's portion of a single item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub share: Share,
}

/// What a participant owes: their item shares plus their part of the surcharge.
/// Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementEntry {
    pub participant_id: ParticipantId,
    pub participant: String,
    pub total_owed: Share,
    /// Equal part of the surcharge, already included in `total_owed`
    pub surcharge_share: Share,
    /// Item shares in the order the items were added to the bill
    pub line_items: Vec<LineItem>,
}

impl SettlementEntry {
    /// Sum of item shares, excluding the surcharge.
    pub fn items_total(&self) -> Share {
        self.line_items.iter().map(|line| line.share).sum()
    }
}

/// Split an amount equally `ways` ways. Returns None when there is nobody to
/// split between, so callers never divide by zero.
pub fn equal_share(amount: Cents, ways: usize) -> Option<Share> {
    if ways == 0 {
        None
    } else {
        Some(amount as Share / ways as Share)
    }
}

/// Compute what each participant owes, in participant order.
///
/// Every item with at least one participant is split equally among them.
/// Items nobody shares are left out of every total. The surcharge is split
/// by headcount across all participants regardless of what they had.
pub fn compute_settlement(
    participants: &[Participant],
    items: &[Item],
    surcharge_cents: Cents,
) -> Vec<SettlementEntry> {
    if participants.is_empty() {
        return Vec::new();
    }

    let mut entries: Vec<SettlementEntry> = participants
        .iter()
        .map(|p| SettlementEntry {
            participant_id: p.id,
            participant: p.name.clone(),
            total_owed: 0.0,
            surcharge_share: 0.0,
            line_items: Vec::new(),
        })
        .collect();

    let index: HashMap<ParticipantId, usize> = participants
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    for item in items {
        let Some(share) = equal_share(item.amount_cents, item.participants().len()) else {
            continue;
        };
        for participant_id in item.participants() {
            if let Some(&i) = index.get(participant_id) {
                let entry = &mut entries[i];
                entry.total_owed += share;
                entry.line_items.push(LineItem {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    share,
                });
            }
        }
    }

    if let Some(surcharge_share) = equal_share(surcharge_cents, participants.len()) {
        for entry in &mut entries {
            entry.total_owed += surcharge_share;
            entry.surcharge_share = surcharge_share;
        }
    }

    entries
}
