//! Warehouse registry.
//!
//! Warehouses are slow-moving reference data: the ledger only consults the
//! registry to confirm a warehouse exists and still accepts movements.

pub mod warehouse;

pub use warehouse::{Warehouse, WarehouseKind, WarehouseRegistry};
