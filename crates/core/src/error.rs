//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
/// None of these are retryable: the same input fails the same way again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The reason/delta/price combination is not allowed.
    #[error("invalid reason: {0}")]
    InvalidReason(String),

    /// The referenced item does not exist or has been disabled.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The change would drive stock below zero. A business-rule rejection,
    /// not a defect: the caller sees current stock and the offending delta.
    #[error("stock cannot go negative (current: {current}, delta: {delta})")]
    NegativeStock { current: i64, delta: i64 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (e.g. duplicate item name).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_reason(msg: impl Into<String>) -> Self {
        Self::InvalidReason(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn item_not_found(id: ItemId) -> Self {
        Self::ItemNotFound(id)
    }

    pub fn negative_stock(current: i64, delta: i64) -> Self {
        Self::NegativeStock { current, delta }
    }
}
