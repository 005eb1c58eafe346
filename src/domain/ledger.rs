use super::{
    compute_settlement, Cents, Item, ItemId, Participant, ParticipantId, SettlementEntry,
};

/// The bill being split: who is at the table, what was ordered and who
/// shared it, and a flat surcharge split evenly across everyone.
///
/// Every mutation either applies fully or is rejected with the ledger left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    participants: Vec<Participant>,
    items: Vec<Item>,
    surcharge_cents: Cents,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Participants in the order they were added.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Items in the order they were added.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn surcharge(&self) -> Cents {
        self.surcharge_cents
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Sum of every item amount, shared or not.
    pub fn item_total(&self) -> Cents {
        self.items.iter().map(|i| i.amount_cents).sum()
    }

    /// Items plus surcharge. Mutations that would overflow it are rejected,
    /// so it always fits in `Cents`.
    pub fn bill_total(&self) -> Cents {
        self.item_total() + self.surcharge_cents
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty() && self.items.is_empty() && self.surcharge_cents == 0
    }

    // ========================
    // Participants
    // ========================

    /// Add a participant. The name is trimmed and must not be empty.
    pub fn add_participant(&mut self, name: &str) -> Result<Participant, BillError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BillError::InvalidInput(
                "participant name cannot be empty".to_string(),
            ));
        }

        let participant = Participant::new(name);
        assert!(
            self.participant(participant.id).is_none(),
            "Participant id collision"
        );
        self.participants.push(participant.clone());
        Ok(participant)
    }

    /// Remove a participant and take them off every item they shared.
    /// Items stay on the bill even if nobody shares them anymore.
    /// Returns None if there was no such participant.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Option<Participant> {
        let position = self.participants.iter().position(|p| p.id == id)?;
        let removed = self.participants.remove(position);
        for item in &mut self.items {
            item.remove_participant(id);
        }
        Some(removed)
    }

    // ========================
    // Items
    // ========================

    /// Add an item that nobody shares yet. The name is trimmed and must not
    /// be empty; the amount must be positive.
    pub fn add_item(&mut self, name: &str, amount_cents: Cents) -> Result<Item, BillError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BillError::InvalidInput(
                "item name cannot be empty".to_string(),
            ));
        }
        if amount_cents <= 0 {
            return Err(BillError::InvalidInput(format!(
                "item amount must be positive, got {} cents",
                amount_cents
            )));
        }
        let amounts = self.items.iter().map(|i| i.amount_cents).chain([amount_cents]);
        if checked_total(amounts, self.surcharge_cents).is_none() {
            return Err(BillError::InvalidInput(
                "bill total is too large".to_string(),
            ));
        }

        let item = Item::new(name, amount_cents);
        assert!(self.item(item.id).is_none(), "Item id collision");
        self.items.push(item.clone());
        Ok(item)
    }

    /// Remove an item. Returns None if there was no such item.
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let position = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(position))
    }

    /// Flip whether a participant shares an item.
    /// Returns whether the participant shares the item afterwards.
    pub fn toggle_participation(
        &mut self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> Result<bool, BillError> {
        if self.participant(participant_id).is_none() {
            return Err(BillError::ParticipantNotFound(participant_id));
        }
        let item = self.item_mut(item_id)?;
        Ok(item.toggle(participant_id))
    }

    /// Make every current participant share the item.
    pub fn assign_all_current_participants(&mut self, item_id: ItemId) -> Result<(), BillError> {
        let everyone: Vec<ParticipantId> = self.participants.iter().map(|p| p.id).collect();
        let item = self.item_mut(item_id)?;
        item.set_participants(everyone);
        Ok(())
    }

    // ========================
    // Surcharge
    // ========================

    /// Set the flat surcharge (tax, service) split evenly across everyone.
    pub fn set_surcharge(&mut self, amount_cents: Cents) -> Result<(), BillError> {
        if amount_cents < 0 {
            return Err(BillError::InvalidInput(format!(
                "surcharge cannot be negative, got {} cents",
                amount_cents
            )));
        }
        let amounts = self.items.iter().map(|i| i.amount_cents);
        if checked_total(amounts, amount_cents).is_none() {
            return Err(BillError::InvalidInput(
                "bill total is too large".to_string(),
            ));
        }
        self.surcharge_cents = amount_cents;
        Ok(())
    }

    /// Forget everyone and everything. Calling it on an empty ledger is a no-op.
    pub fn clear(&mut self) {
        self.participants.clear();
        self.items.clear();
        self.surcharge_cents = 0;
    }

    /// Compute what each participant owes right now, in participant order.
    pub fn compute_settlement(&self) -> Vec<SettlementEntry> {
        compute_settlement(&self.participants, &self.items, self.surcharge_cents)
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item, BillError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BillError::ItemNotFound(id))
    }
}

fn checked_total(amounts: impl Iterator<Item = Cents>, surcharge: Cents) -> Option<Cents> {
    amounts.fold(Some(surcharge), |total, amount| total?.checked_add(amount))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillError {
    /// Empty name, non-positive amount, negative surcharge, overflowing total
    InvalidInput(String),
    ParticipantNotFound(ParticipantId),
    ItemNotFound(ItemId),
}

impl BillError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BillError::ParticipantNotFound(_) | BillError::ItemNotFound(_)
        )
    }
}

impl std::fmt::Display for BillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillError::InvalidInput(reason) => write!(f, "Invalid input: {}", reason),
            BillError::ParticipantNotFound(id) => write!(f, "Participant not found: {}", id),
            BillError::ItemNotFound(id) => write!(f, "Item not found: {}", id),
        }
    }
}

impl std::error::Error for BillError {}
