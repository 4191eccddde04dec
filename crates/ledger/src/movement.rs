//! Movement requests and the persisted movement row.
//!
//! Requests are a closed command enum: each kind carries exactly the fields
//! it needs, so a malformed combination (a transfer without a destination, a
//! receipt without a cost) cannot be expressed at all. What remains to check
//! at runtime is magnitudes, distinct warehouses and a non-empty reason.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerError, LedgerResult, MovementId, ProductId, UserId, WarehouseId};

use crate::level::LevelKey;

/// Direction/semantics of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    In,
    Out,
    Transfer,
    Adjustment,
}

/// Link back to the business event that caused a movement (closed set; a
/// free-form reference string cannot enter the ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Manual,
    Sale,
    Purchase,
    Adjustment,
    Inventory,
}

/// Caller-supplied context shared by every movement kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementMeta {
    /// Required, non-empty free text explaining the movement.
    pub reason: String,
    pub reference_kind: ReferenceKind,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_by: UserId,
}

impl MovementMeta {
    pub fn manual(reason: impl Into<String>, created_by: UserId) -> Self {
        Self {
            reason: reason.into(),
            reference_kind: ReferenceKind::Manual,
            reference_number: None,
            notes: None,
            created_by,
        }
    }
}

/// Command: receive stock into a warehouse (IN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub product_id: ProductId,
    pub warehouse_to: WarehouseId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub meta: MovementMeta,
}

/// Command: issue stock out of a warehouse (OUT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStock {
    pub product_id: ProductId,
    pub warehouse_from: WarehouseId,
    pub quantity: Decimal,
    pub meta: MovementMeta,
}

/// Command: move stock between two warehouses (TRANSFER).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStock {
    pub product_id: ProductId,
    pub warehouse_from: WarehouseId,
    pub warehouse_to: WarehouseId,
    pub quantity: Decimal,
    pub meta: MovementMeta,
}

/// Command: shift a warehouse's quantity by a signed delta (ADJUSTMENT).
/// No cost recompute, whichever direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    /// Signed, non-zero. Decreases are bounded by the current quantity.
    pub delta: Decimal,
    pub meta: MovementMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementCommand {
    Receive(ReceiveStock),
    Issue(IssueStock),
    Transfer(TransferStock),
    Adjust(AdjustStock),
}

impl MovementCommand {
    pub fn product_id(&self) -> ProductId {
        match self {
            MovementCommand::Receive(c) => c.product_id,
            MovementCommand::Issue(c) => c.product_id,
            MovementCommand::Transfer(c) => c.product_id,
            MovementCommand::Adjust(c) => c.product_id,
        }
    }

    pub fn meta(&self) -> &MovementMeta {
        match self {
            MovementCommand::Receive(c) => &c.meta,
            MovementCommand::Issue(c) => &c.meta,
            MovementCommand::Transfer(c) => &c.meta,
            MovementCommand::Adjust(c) => &c.meta,
        }
    }

    /// Every warehouse the command references.
    pub fn warehouses(&self) -> Vec<WarehouseId> {
        match self {
            MovementCommand::Receive(c) => vec![c.warehouse_to],
            MovementCommand::Issue(c) => vec![c.warehouse_from],
            MovementCommand::Transfer(c) => vec![c.warehouse_from, c.warehouse_to],
            MovementCommand::Adjust(c) => vec![c.warehouse_id],
        }
    }

    /// Every stock level key the command touches.
    pub fn level_keys(&self) -> Vec<LevelKey> {
        self.warehouses()
            .into_iter()
            .map(|w| LevelKey::new(self.product_id(), w))
            .collect()
    }

    /// Deterministic shape checks: magnitudes, distinct warehouses, reason.
    /// Catalog/registry lookups are the applier's job.
    pub fn validate_shape(&self) -> LedgerResult<()> {
        if self.meta().reason.trim().is_empty() {
            return Err(LedgerError::validation("reason cannot be empty"));
        }

        match self {
            MovementCommand::Receive(c) => {
                ensure_positive_quantity(c.quantity)?;
                if c.unit_cost < Decimal::ZERO {
                    return Err(LedgerError::validation("unit_cost cannot be negative"));
                }
            }
            MovementCommand::Issue(c) => ensure_positive_quantity(c.quantity)?,
            MovementCommand::Transfer(c) => {
                ensure_positive_quantity(c.quantity)?;
                if c.warehouse_from == c.warehouse_to {
                    return Err(LedgerError::validation(
                        "transfer source and destination must differ",
                    ));
                }
            }
            MovementCommand::Adjust(c) => {
                if c.delta.is_zero() {
                    return Err(LedgerError::validation("adjustment delta cannot be zero"));
                }
            }
        }

        Ok(())
    }
}

fn ensure_positive_quantity(quantity: Decimal) -> LedgerResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::validation("quantity must be positive"));
    }
    Ok(())
}

/// A validated movement ready for the movement ledger, before the ledger has
/// assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Positive magnitude; direction is carried by `kind` and which of the
    /// warehouse fields is set.
    pub quantity: Decimal,
    pub warehouse_from_id: Option<WarehouseId>,
    pub warehouse_to_id: Option<WarehouseId>,
    pub unit_cost: Option<Decimal>,
    pub reason: String,
    pub reference_kind: ReferenceKind,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_by: UserId,
}

impl MovementDraft {
    pub fn into_movement(self, id: MovementId, created_at: DateTime<Utc>) -> StockMovement {
        StockMovement {
            id,
            product_id: self.product_id,
            kind: self.kind,
            quantity: self.quantity,
            warehouse_from_id: self.warehouse_from_id,
            warehouse_to_id: self.warehouse_to_id,
            unit_cost: self.unit_cost,
            reason: self.reason,
            reference_kind: self.reference_kind,
            reference_number: self.reference_number,
            notes: self.notes,
            created_at,
            created_by: self.created_by,
        }
    }
}

/// One persisted row of the audit trail. Immutable: corrections happen via
/// new compensating movements, never edits or deletes.
///
/// An ADJUSTMENT stores its magnitude in `quantity` and its direction through
/// the warehouse fields: increases set `warehouse_to_id`, decreases set
/// `warehouse_from_id`. That makes [`StockMovement::signed_delta_for`] a
/// single rule for all four kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub warehouse_from_id: Option<WarehouseId>,
    pub warehouse_to_id: Option<WarehouseId>,
    pub unit_cost: Option<Decimal>,
    pub reason: String,
    pub reference_kind: ReferenceKind,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl StockMovement {
    /// Whether the movement touched this warehouse at all.
    pub fn touches(&self, warehouse_id: WarehouseId) -> bool {
        self.warehouse_from_id == Some(warehouse_id) || self.warehouse_to_id == Some(warehouse_id)
    }

    /// The signed quantity change this movement applied to `warehouse_id`:
    /// `+quantity` where the warehouse is the destination, `-quantity` where
    /// it is the source, zero otherwise. Summing this over the full ledger
    /// reconstructs the warehouse's current quantity exactly.
    pub fn signed_delta_for(&self, warehouse_id: WarehouseId) -> Decimal {
        let mut delta = Decimal::ZERO;
        if self.warehouse_to_id == Some(warehouse_id) {
            delta += self.quantity;
        }
        if self.warehouse_from_id == Some(warehouse_id) {
            delta -= self.quantity;
        }
        delta
    }
}
