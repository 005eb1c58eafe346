use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    parse_amount, Cents, Item, ItemId, Ledger, Participant, ParticipantId,
};

use super::{AppError, SettlementReport};

/// Application service owning one bill-splitting session.
/// This is the primary interface for any client (CLI session, importers, tests).
///
/// Participants and items can be referred to by id, by name (case-insensitive,
/// first match wins) or by their 1-based position in the listing.
#[derive(Debug, Default)]
pub struct BillService {
    ledger: Ledger,
    quick_add: bool,
}

/// Result of toggling participation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub item_name: String,
    pub participant_name: String,
    /// Whether the participant shares the item after the toggle
    pub sharing: bool,
}

impl BillService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with quick-add mode on or off.
    pub fn with_quick_add(mut self, quick_add: bool) -> Self {
        self.quick_add = quick_add;
        self
    }

    /// Read-only view of the bill.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn quick_add(&self) -> bool {
        self.quick_add
    }

    /// In quick-add mode, new items are immediately shared by everyone
    /// currently on the bill.
    pub fn set_quick_add(&mut self, enabled: bool) {
        self.quick_add = enabled;
        debug!(enabled, "quick-add mode changed");
    }

    // ========================
    // Participants
    // ========================

    pub fn add_participant(&mut self, name: &str) -> Result<Participant, AppError> {
        let participant = self.ledger.add_participant(name).inspect_err(|err| {
            warn!(%err, "rejected participant");
        })?;
        debug!(name = %participant.name, id = %participant.id, "participant added");
        Ok(participant)
    }

    /// Remove a participant, taking them off every item. Returns None if the
    /// reference matches nobody.
    pub fn remove_participant(&mut self, reference: &str) -> Option<Participant> {
        let id = self.participant_id(reference)?;
        let removed = self.ledger.remove_participant(id)?;
        debug!(name = %removed.name, id = %removed.id, "participant removed");
        Some(removed)
    }

    pub fn find_participant(&self, reference: &str) -> Option<&Participant> {
        let id = self.participant_id(reference)?;
        self.ledger.participant(id)
    }

    /// Look a participant up by name only (case-insensitive, first match).
    /// Bill files name people; a number or id there is just a name.
    pub fn find_participant_by_name(&self, name: &str) -> Option<&Participant> {
        self.ledger.participants().iter().find(|p| p.is_named(name))
    }

    // ========================
    // Items
    // ========================

    /// Add an item from typed text, e.g. ("Pizza", "20") or ("Tea", "$2.50").
    pub fn add_item(&mut self, name: &str, amount: &str) -> Result<Item, AppError> {
        let amount_cents = parse_amount(amount).map_err(|source| {
            warn!(input = amount, "rejected item amount");
            AppError::InvalidAmount {
                input: amount.trim().to_string(),
                source,
            }
        })?;
        self.add_item_cents(name, amount_cents)
    }

    /// Add an item with an amount already in cents.
    pub fn add_item_cents(&mut self, name: &str, amount_cents: Cents) -> Result<Item, AppError> {
        let item = self
            .ledger
            .add_item(name, amount_cents)
            .inspect_err(|err| warn!(%err, "rejected item"))?;

        if self.quick_add {
            self.ledger.assign_all_current_participants(item.id)?;
        }
        debug!(
            name = %item.name,
            amount_cents = item.amount_cents,
            id = %item.id,
            quick_add = self.quick_add,
            "item added"
        );

        Ok(self.ledger.item(item.id).cloned().unwrap_or(item))
    }

    /// Add an item from a free-form phrase such as "pizza $15", typically
    /// the output of speech-to-text.
    pub fn add_item_from_phrase(&mut self, phrase: &str) -> Result<Item, AppError> {
        let Some((name, amount_cents)) = parse_item_phrase(phrase) else {
            warn!(phrase, "no amount in phrase");
            return Err(AppError::NoAmountInPhrase(phrase.trim().to_string()));
        };
        self.add_item_cents(&name, amount_cents)
    }

    /// Remove an item. Returns None if the reference matches nothing.
    pub fn remove_item(&mut self, reference: &str) -> Option<Item> {
        let id = self.item_id(reference)?;
        let removed = self.ledger.remove_item(id)?;
        debug!(name = %removed.name, id = %removed.id, "item removed");
        Some(removed)
    }

    pub fn find_item(&self, reference: &str) -> Option<&Item> {
        let id = self.item_id(reference)?;
        self.ledger.item(id)
    }

    /// Flip whether a participant shares an item.
    pub fn toggle(
        &mut self,
        item_ref: &str,
        participant_ref: &str,
    ) -> Result<ToggleResult, AppError> {
        let item_id = self
            .item_id(item_ref)
            .ok_or_else(|| AppError::ItemNotFound(item_ref.to_string()))?;
        let participant_id = self
            .participant_id(participant_ref)
            .ok_or_else(|| AppError::ParticipantNotFound(participant_ref.to_string()))?;

        let sharing = self.ledger.toggle_participation(item_id, participant_id)?;
        let result = ToggleResult {
            item_name: self.item_name(item_id),
            participant_name: self.participant_name(participant_id),
            sharing,
        };
        debug!(
            item = %result.item_name,
            participant = %result.participant_name,
            sharing,
            "participation toggled"
        );
        Ok(result)
    }

    /// Make everyone currently on the bill share an item.
    pub fn assign_all(&mut self, item_ref: &str) -> Result<Item, AppError> {
        let item_id = self
            .item_id(item_ref)
            .ok_or_else(|| AppError::ItemNotFound(item_ref.to_string()))?;
        self.ledger.assign_all_current_participants(item_id)?;

        let item = self
            .ledger
            .item(item_id)
            .cloned()
            .ok_or_else(|| AppError::ItemNotFound(item_ref.to_string()))?;
        debug!(name = %item.name, sharers = item.participants().len(), "item assigned to all");
        Ok(item)
    }

    // ========================
    // Surcharge and reset
    // ========================

    /// Set the flat surcharge from typed text. Zero is allowed, negatives are not.
    pub fn set_surcharge(&mut self, amount: &str) -> Result<Cents, AppError> {
        let amount_cents = parse_amount(amount).map_err(|source| {
            warn!(input = amount, "rejected surcharge");
            AppError::InvalidAmount {
                input: amount.trim().to_string(),
                source,
            }
        })?;
        self.set_surcharge_cents(amount_cents)
    }

    pub fn set_surcharge_cents(&mut self, amount_cents: Cents) -> Result<Cents, AppError> {
        self.ledger
            .set_surcharge(amount_cents)
            .inspect_err(|err| warn!(%err, "rejected surcharge"))?;
        debug!(amount_cents, "surcharge set");
        Ok(amount_cents)
    }

    /// Start over with an empty bill. Quick-add mode is kept.
    pub fn clear(&mut self) {
        self.ledger.clear();
        debug!("bill cleared");
    }

    /// Compute the settlement for the bill as it stands.
    pub fn report(&self) -> SettlementReport {
        SettlementReport::from_ledger(&self.ledger, Utc::now())
    }

    // ========================
    // Reference resolution
    // ========================

    fn participant_id(&self, reference: &str) -> Option<ParticipantId> {
        resolve(
            self.ledger.participants(),
            reference,
            |p| p.id,
            |p, name| p.is_named(name),
        )
    }

    fn item_id(&self, reference: &str) -> Option<ItemId> {
        resolve(
            self.ledger.items(),
            reference,
            |i| i.id,
            |i, name| i.is_named(name),
        )
    }

    fn participant_name(&self, id: ParticipantId) -> String {
        self.ledger
            .participant(id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn item_name(&self, id: ItemId) -> String {
        self.ledger
            .item(id)
            .map(|i| i.name.clone())
            .unwrap_or_default()
    }
}

/// Resolve a typed reference: an id, then a name, then a 1-based position.
fn resolve<T>(
    entries: &[T],
    reference: &str,
    id_of: impl Fn(&T) -> Uuid,
    is_named: impl Fn(&T, &str) -> bool,
) -> Option<Uuid> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if let Ok(id) = Uuid::parse_str(reference) {
        return entries.iter().map(&id_of).find(|candidate| *candidate == id);
    }

    if let Some(entry) = entries.iter().find(|e| is_named(e, reference)) {
        return Some(id_of(entry));
    }

    reference
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| entries.get(index))
        .map(id_of)
}

/// Split a phrase like "pizza $15" or "2 coffees 7.50" into an item name and
/// an amount. The last word that reads as money is the amount; the other
/// words form the name. Returns None when no word reads as money.
pub fn parse_item_phrase(phrase: &str) -> Option<(String, Cents)> {
    let words: Vec<&str> = phrase.split_whitespace().collect();

    let (position, amount_cents) = words.iter().enumerate().rev().find_map(|(i, word)| {
        let word = word.trim_end_matches([',', '!', '?', ';']);
        parse_amount(word).ok().map(|cents| (i, cents))
    })?;

    let name = words
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, word)| *word)
        .collect::<Vec<_>>()
        .join(" ");

    Some((name, amount_cents))
}
