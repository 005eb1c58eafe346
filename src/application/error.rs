use thiserror::Error;

use crate::domain::{BillError, ParseCentsError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid amount '{input}': {source}")]
    InvalidAmount {
        input: String,
        source: ParseCentsError,
    },

    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Could not find an amount in '{0}' (try something like 'pizza $15')")]
    NoAmountInPhrase(String),

    #[error(transparent)]
    Bill(#[from] BillError),
}

impl AppError {
    /// True for rejected input (bad names, amounts, phrases), as opposed to
    /// references to things that are no longer on the bill.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            AppError::InvalidInput(_)
            | AppError::InvalidAmount { .. }
            | AppError::NoAmountInPhrase(_) => true,
            AppError::Bill(err) => !err.is_not_found(),
            AppError::ParticipantNotFound(_) | AppError::ItemNotFound(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        !self.is_invalid_input()
    }
}
