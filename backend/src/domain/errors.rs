//! Error taxonomy shared by every service in this crate.
//!
//! Validation errors and `NotFound` are detected before any mutation and
//! block the whole operation. `Encode` and `Persistence` are recoverable:
//! they are logged and worked around, never propagated to block a mutation
//! that already happened in memory.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Name cannot be empty")]
    InvalidName,

    #[error("Price must be a non-negative number")]
    InvalidPrice,

    #[error("Budget must be a non-negative number")]
    InvalidBudget,

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("Unsupported transfer format: {0}")]
    UnsupportedFormat(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Failed to persist document: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn list_not_found(id: &str) -> Self {
        DomainError::NotFound("List", id.to_string())
    }

    pub fn group_not_found(id: &str) -> Self {
        DomainError::NotFound("Group", id.to_string())
    }

    pub fn item_not_found(id: &str) -> Self {
        DomainError::NotFound("Item", id.to_string())
    }
}
