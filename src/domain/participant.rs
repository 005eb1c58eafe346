use serde::Serialize;
use uuid::Uuid;

pub type ParticipantId = Uuid;

/// A person sharing the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    /// Create a participant with a fresh id. The name must already be trimmed
    /// and validated by the ledger.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Case-insensitive name comparison, used when resolving typed references.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participants_get_distinct_ids() {
        let a = Participant::new("Alice");
        let b = Participant::new("Alice");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_is_named_ignores_case_and_padding() {
        let p = Participant::new("Alice");
        assert!(p.is_named("alice"));
        assert!(p.is_named("  ALICE "));
        assert!(!p.is_named("Alicia"));
    }
}
