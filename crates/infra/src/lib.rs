//! Infrastructure layer: storage implementations behind the ledger's traits.
//!
//! Only in-memory implementations live here today (tests/dev and small
//! single-process deployments). SQL-backed implementations slot in behind the
//! same traits without touching the ledger.

pub mod in_memory;

pub use in_memory::{
    InMemoryMovementLedger, InMemoryProductCatalog, InMemoryStockLevelStore,
    InMemoryWarehouseRegistry,
};
