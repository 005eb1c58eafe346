use serde::Serialize;
use uuid::Uuid;

use super::{Cents, ParticipantId};

pub type ItemId = Uuid;

/// A single billed line: its cost and the participants who shared it.
///
/// The sharing set keeps the order in which participants joined it and never
/// contains the same id twice. It is only mutated through the ledger, which
/// guarantees every id refers to a current participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    participants: Vec<ParticipantId>,
}

impl Item {
    /// Create an item with nobody sharing it yet. Name and amount must
    /// already be validated by the ledger.
    pub(crate) fn new(name: impl Into<String>, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Item amount must be positive");
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount_cents,
            participants: Vec::new(),
        }
    }

    /// Ids of the participants sharing this item.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn is_shared_by(&self, participant_id: ParticipantId) -> bool {
        self.participants.contains(&participant_id)
    }

    /// Returns true if nobody has been assigned to this item, meaning its
    /// cost is not charged to anyone.
    pub fn is_unassigned(&self) -> bool {
        self.participants.is_empty()
    }

    /// Case-insensitive name comparison, used when resolving typed references.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Flip membership of a participant. Returns whether they now share the item.
    pub(crate) fn toggle(&mut self, participant_id: ParticipantId) -> bool {
        if self.remove_participant(participant_id) {
            false
        } else {
            self.participants.push(participant_id);
            true
        }
    }

    /// Returns true if the participant was sharing the item.
    pub(crate) fn remove_participant(&mut self, participant_id: ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|id| *id != participant_id);
        self.participants.len() != before
    }

    pub(crate) fn set_participants(
        &mut self,
        participant_ids: impl IntoIterator<Item = ParticipantId>,
    ) {
        self.participants.clear();
        for id in participant_ids {
            if !self.participants.contains(&id) {
                self.participants.push(id);
            }
        }
    }
}
