//! Materialized stock levels: quantity on hand + weighted-average cost.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerError, LedgerResult, ProductId, WarehouseId};

/// Key of one stock level row.
///
/// Also the unit of serialization: all mutations touching one key are
/// strictly ordered. `Ord` gives the fixed total order used when a request
/// has to hold several keys at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelKey {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
}

impl LevelKey {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
        }
    }
}

/// Current state of one product in one warehouse.
///
/// Levels are created lazily at zero on the first referencing movement and
/// never deleted: a level that has gone back to zero keeps its row (and its
/// last average cost) for history. Only the applier mutates levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    /// The zero level, returned for keys no movement has touched yet.
    pub fn empty(key: LevelKey) -> Self {
        Self {
            product_id: key.product_id,
            warehouse_id: key.warehouse_id,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn key(&self) -> LevelKey {
        LevelKey::new(self.product_id, self.warehouse_id)
    }

    /// Increase by `quantity` priced at `unit_cost`, re-weighting the average:
    /// `new_avg = (old_qty * old_avg + qty * unit_cost) / (old_qty + qty)`.
    pub fn receive(&self, quantity: Decimal, unit_cost: Decimal, at: DateTime<Utc>) -> Self {
        let new_quantity = self.quantity + quantity;
        // quantity > 0 is validated upstream, so new_quantity > 0 here.
        let new_average = (self.quantity * self.average_cost + quantity * unit_cost) / new_quantity;

        Self {
            quantity: new_quantity,
            average_cost: new_average,
            updated_at: at,
            ..*self
        }
    }

    /// Decrease by `quantity`; average cost is untouched by issues.
    pub fn issue(&self, quantity: Decimal, at: DateTime<Utc>) -> LedgerResult<Self> {
        if self.quantity < quantity {
            return Err(LedgerError::insufficient_stock(quantity, self.quantity));
        }

        Ok(Self {
            quantity: self.quantity - quantity,
            updated_at: at,
            ..self.clone()
        })
    }

    /// Shift by a signed `delta` without touching the average cost.
    /// Decreases are bounded by the current quantity.
    pub fn adjust(&self, delta: Decimal, at: DateTime<Utc>) -> LedgerResult<Self> {
        let new_quantity = self.quantity + delta;
        if new_quantity < Decimal::ZERO {
            return Err(LedgerError::insufficient_stock(-delta, self.quantity));
        }

        Ok(Self {
            quantity: new_quantity,
            updated_at: at,
            ..self.clone()
        })
    }
}

/// Storage for materialized stock levels.
///
/// `get` returns the zero level when the key is absent — it never fails for
/// "not found". Implementations only need point reads and writes to be
/// individually consistent; the read-check-write sequence is serialized by
/// the applier's [`crate::locks::LockTable`], which is what makes a level
/// update an atomic compare-and-update per key.
pub trait StockLevelStore: Send + Sync {
    /// The level for `key`, if any movement has materialized a row for it.
    fn find(&self, key: LevelKey) -> LedgerResult<Option<StockLevel>>;

    /// Current level for `key`; the zero level when no row exists.
    fn get(&self, key: LevelKey) -> LedgerResult<StockLevel> {
        Ok(self.find(key)?.unwrap_or_else(|| StockLevel::empty(key)))
    }

    fn put(&self, level: StockLevel) -> LedgerResult<()>;

    /// Write several levels as one unit. The default writes sequentially and
    /// is only suitable for backends that are read exclusively under the
    /// applier's key locks; backends with their own readers should override
    /// it with a single atomic write.
    fn put_many(&self, levels: &[StockLevel]) -> LedgerResult<()> {
        for level in levels {
            self.put(level.clone())?;
        }
        Ok(())
    }

    /// Drop the rows for `keys`. The applier's rollback uses this for keys a
    /// failed commit attempt materialized; committed levels are never removed.
    fn remove(&self, keys: &[LevelKey]) -> LedgerResult<()>;

    /// Read-modify-write convenience for single-key callers. Increases apply
    /// `cost_for_increase` through the weighted average when given; decreases
    /// fail with `InsufficientStock` rather than going negative.
    ///
    /// Must be called under the key's serialization lock to be atomic.
    fn apply_delta(
        &self,
        key: LevelKey,
        delta: Decimal,
        cost_for_increase: Option<Decimal>,
    ) -> LedgerResult<StockLevel> {
        let current = self.get(key)?;
        let now = Utc::now();

        let next = if delta >= Decimal::ZERO {
            match cost_for_increase {
                Some(cost) if delta > Decimal::ZERO => current.receive(delta, cost, now),
                _ => current.adjust(delta, now)?,
            }
        } else {
            current.adjust(delta, now)?
        };

        self.put(next.clone())?;
        Ok(next)
    }
}

impl<S> StockLevelStore for Arc<S>
where
    S: StockLevelStore + ?Sized,
{
    fn find(&self, key: LevelKey) -> LedgerResult<Option<StockLevel>> {
        (**self).find(key)
    }

    fn get(&self, key: LevelKey) -> LedgerResult<StockLevel> {
        (**self).get(key)
    }

    fn put(&self, level: StockLevel) -> LedgerResult<()> {
        (**self).put(level)
    }

    fn put_many(&self, levels: &[StockLevel]) -> LedgerResult<()> {
        (**self).put_many(levels)
    }

    fn remove(&self, keys: &[LevelKey]) -> LedgerResult<()> {
        (**self).remove(keys)
    }
}
