//! `stockpile-ledger` — the multi-warehouse stock ledger engine.
//!
//! Two persistent structures back the ledger:
//!
//! - the **stock level store**: materialized quantity on hand and
//!   weighted-average cost, one row per (product, warehouse);
//! - the **movement ledger**: the append-only log of every applied movement,
//!   the audit trail and source of truth (replaying its signed deltas
//!   reconstructs every level exactly).
//!
//! [`StockLedger`] is the only writer: it validates a requested movement,
//! serializes access per (product, warehouse) key, and commits level updates
//! and ledger rows as one atomic unit. A movement either fully exists or does
//! not exist at all.

pub mod applier;
pub mod level;
pub mod locks;
pub mod movement;
pub mod store;

pub use applier::{MovementCommitted, StockLedger};
pub use level::{LevelKey, StockLevel, StockLevelStore};
pub use locks::{KeyGuard, LockTable};
pub use movement::{
    AdjustStock, IssueStock, MovementCommand, MovementDraft, MovementKind, MovementMeta,
    ReceiveStock, ReferenceKind, StockMovement, TransferStock,
};
pub use store::{MovementFilter, MovementLedger};
