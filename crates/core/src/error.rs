//! Ledger error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::{ProductId, WarehouseId};

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Every way a movement request can fail.
///
/// Variants are deliberately distinguishable so callers can surface each kind
/// differently (an insufficient-stock rejection carries both the requested and
/// the available quantity; it must never collapse into a generic failure).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or missing request fields (bad ids, non-positive quantity,
    /// same-warehouse transfer, empty reason, unknown product/warehouse).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A decrement would drive the stock level below zero. Nothing was persisted.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    /// The warehouse exists but no longer accepts movements.
    #[error("warehouse {0} is inactive")]
    WarehouseInactive(WarehouseId),

    /// The product exists but is not tracked by the stock ledger.
    #[error("product {0} is not stockable")]
    ProductNotStockable(ProductId),

    /// The per-key serialization lock was not acquired within the configured
    /// bound. Retryable with backoff.
    #[error("lock not acquired within {waited_ms}ms")]
    ConcurrencyTimeout { waited_ms: u64 },

    /// A persistence failure. Any partial writes were rolled back, so the
    /// caller may safely retry.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyTimeout { .. } | Self::Storage(_)
        )
    }
}
