//! Movement ledger storage contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockpile_core::{LedgerResult, ProductId, WarehouseId};

use crate::movement::{MovementDraft, MovementKind, ReferenceKind, StockMovement};

/// Query filters over the movement log. All fields are conjunctive; a
/// default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    /// Matches movements where the warehouse appears as source or destination.
    pub warehouse_id: Option<WarehouseId>,
    pub kind: Option<MovementKind>,
    pub reference_kind: Option<ReferenceKind>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Cap on the number of (newest-first) results.
    pub limit: Option<usize>,
}

impl MovementFilter {
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn of_kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_reference_kind(mut self, reference_kind: ReferenceKind) -> Self {
        self.reference_kind = Some(reference_kind);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn newest(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        if let Some(p) = self.product_id {
            if movement.product_id != p {
                return false;
            }
        }
        if let Some(w) = self.warehouse_id {
            if !movement.touches(w) {
                return false;
            }
        }
        if let Some(k) = self.kind {
            if movement.kind != k {
                return false;
            }
        }
        if let Some(r) = self.reference_kind {
            if movement.reference_kind != r {
                return false;
            }
        }
        if let Some(from) = self.from {
            if movement.created_at < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if movement.created_at > until {
                return false;
            }
        }
        true
    }
}

/// Append-only movement log: the audit trail and source of truth.
///
/// Validation never reaches the ledger — a draft handed to `append` has
/// already passed the applier's checks, so the only failure mode left is
/// storage itself. Entries are never mutated or removed.
pub trait MovementLedger: Send + Sync {
    /// Persist one movement, assigning its id and timestamp.
    fn append(&self, draft: MovementDraft) -> LedgerResult<StockMovement>;

    /// Persist several movements as one unit: either every draft lands in the
    /// log or none does. The default implementation appends sequentially and
    /// is only suitable for implementations whose `append` cannot fail after
    /// the first draft succeeded; transactional backends should override it.
    fn append_batch(&self, drafts: Vec<MovementDraft>) -> LedgerResult<Vec<StockMovement>> {
        drafts.into_iter().map(|d| self.append(d)).collect()
    }

    /// Movements matching `filter`, newest first (id descending as the
    /// tiebreaker for equal timestamps).
    fn query(&self, filter: &MovementFilter) -> LedgerResult<Vec<StockMovement>>;
}

impl<M> MovementLedger for Arc<M>
where
    M: MovementLedger + ?Sized,
{
    fn append(&self, draft: MovementDraft) -> LedgerResult<StockMovement> {
        (**self).append(draft)
    }

    fn append_batch(&self, drafts: Vec<MovementDraft>) -> LedgerResult<Vec<StockMovement>> {
        (**self).append_batch(drafts)
    }

    fn query(&self, filter: &MovementFilter) -> LedgerResult<Vec<StockMovement>> {
        (**self).query(filter)
    }
}
