//! `stockpile-core` — shared foundation for the stock ledger.
//!
//! This crate contains only identifiers and the error taxonomy; no IO, no
//! storage, no business rules.

pub mod error;
pub mod id;

pub use error::{LedgerError, LedgerResult};
pub use id::{MovementId, ProductId, UserId, WarehouseId};
