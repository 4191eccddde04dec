//! Movement validator & applier.
//!
//! One orchestration pipeline for every write:
//!
//! ```text
//! MovementCommand(s)
//!   ↓
//! 1. Validate shape + catalog + registry   (nothing persisted on rejection)
//!   ↓
//! 2. Acquire every touched level key       (bounded wait, one shot)
//!   ↓
//! 3. Fold effects through a working set    (stock checks, cumulative for batches)
//!   ↓
//! 4. Commit levels + ledger rows           (atomic; rollback on storage failure)
//!   ↓
//! 5. Publish MovementCommitted per row     (best effort, never undoes a commit)
//! ```
//!
//! A second caller can never observe an intermediate state: until step 4
//! finishes, nothing is written; once it finishes, everything is.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerError, LedgerResult, ProductId, WarehouseId};
use stockpile_events::EventBus;
use stockpile_products::ProductCatalog;
use stockpile_warehouses::WarehouseRegistry;

use crate::level::{LevelKey, StockLevel, StockLevelStore};
use crate::locks::LockTable;
use crate::movement::{MovementCommand, MovementDraft, MovementKind, StockMovement};
use crate::store::{MovementFilter, MovementLedger};

/// Default bound on waiting for contended level keys.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Published on the bus once per committed movement, and returned to the
/// caller: the persisted row plus the level snapshot(s) it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCommitted {
    pub movement: StockMovement,
    /// Levels as of this movement: one entry for IN/OUT/ADJUSTMENT, source
    /// then destination for TRANSFER.
    pub levels: Vec<StockLevel>,
}

/// The stock ledger engine: sole writer of stock levels and the movement log.
///
/// Collaborators are injected as generics so tests run entirely in memory and
/// real backends slot in without touching this orchestration:
///
/// - `C`: product catalog (external contract)
/// - `W`: warehouse registry
/// - `L`: stock level store
/// - `M`: movement ledger (append-only log)
/// - `B`: bus for post-commit notifications
#[derive(Debug)]
pub struct StockLedger<C, W, L, M, B> {
    catalog: C,
    registry: W,
    levels: L,
    movements: M,
    bus: B,
    locks: LockTable,
    lock_timeout: Duration,
}

impl<C, W, L, M, B> StockLedger<C, W, L, M, B> {
    pub fn new(catalog: C, registry: W, levels: L, movements: M, bus: B) -> Self {
        Self {
            catalog,
            registry,
            levels,
            movements,
            bus,
            locks: LockTable::new(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the bound on waiting for contended keys.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

impl<C, W, L, M, B> StockLedger<C, W, L, M, B>
where
    C: ProductCatalog,
    W: WarehouseRegistry,
    L: StockLevelStore,
    M: MovementLedger,
    B: EventBus<MovementCommitted>,
{
    /// Validate and atomically commit one movement.
    pub fn apply(&self, command: MovementCommand) -> LedgerResult<MovementCommitted> {
        let mut committed = self.apply_batch(vec![command])?;
        committed
            .pop()
            .ok_or_else(|| LedgerError::storage("commit produced no movement"))
    }

    /// Validate and atomically commit a batch of movements.
    ///
    /// The batch is one unit: stock checks see the cumulative effect of
    /// earlier commands in the same batch, and if any command fails, no
    /// command's writes are persisted.
    pub fn apply_batch(
        &self,
        commands: Vec<MovementCommand>,
    ) -> LedgerResult<Vec<MovementCommitted>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        for command in &commands {
            self.validate(command)?;
        }

        let mut keys: Vec<LevelKey> = commands.iter().flat_map(|c| c.level_keys()).collect();
        keys.sort_unstable();
        keys.dedup();

        let _guard = self.locks.acquire(&keys, self.lock_timeout)?;

        // Read each key once; fold every command through the working set so
        // a transfer's two legs (and a batch's cumulative decrements) are
        // checked and applied together. Absent keys are remembered as absent
        // so a rollback can un-materialize them.
        let mut working: HashMap<LevelKey, StockLevel> = HashMap::with_capacity(keys.len());
        let mut originals: Vec<(LevelKey, Option<StockLevel>)> = Vec::with_capacity(keys.len());
        for key in &keys {
            let existing = self.levels.find(*key)?;
            let level = existing
                .clone()
                .unwrap_or_else(|| StockLevel::empty(*key));
            originals.push((*key, existing));
            working.insert(*key, level);
        }

        let now = Utc::now();
        let mut drafts: Vec<MovementDraft> = Vec::with_capacity(commands.len());
        let mut snapshots: Vec<Vec<StockLevel>> = Vec::with_capacity(commands.len());
        for command in &commands {
            let (draft, levels_after) = fold_command(command, &mut working, now)?;
            drafts.push(draft);
            snapshots.push(levels_after);
        }

        // Commit. All levels land in one write, then all ledger rows in one
        // append; a failure at either point means storage, and every partial
        // write is rolled back before the error is returned.
        let updated: Vec<StockLevel> = working.into_values().collect();
        if let Err(err) = self.levels.put_many(&updated) {
            self.restore(&originals);
            return Err(err);
        }

        let movements = match self.movements.append_batch(drafts) {
            Ok(movements) => movements,
            Err(err) => {
                self.restore(&originals);
                return Err(err);
            }
        };

        let committed: Vec<MovementCommitted> = movements
            .into_iter()
            .zip(snapshots)
            .map(|(movement, levels)| MovementCommitted { movement, levels })
            .collect();

        for entry in &committed {
            tracing::debug!(
                movement_id = %entry.movement.id,
                kind = ?entry.movement.kind,
                product_id = %entry.movement.product_id,
                quantity = %entry.movement.quantity,
                "movement committed"
            );

            // The movement is durable; a lost notification only delays
            // observers until their next query.
            if let Err(err) = self.bus.publish(entry.clone()) {
                tracing::warn!(
                    movement_id = %entry.movement.id,
                    error = ?err,
                    "post-commit notification failed"
                );
            }
        }

        Ok(committed)
    }

    /// Current level for one (product, warehouse) key; the zero level if no
    /// movement has touched it.
    ///
    /// Reads go through the same per-key lock as writes, so a commit in
    /// flight is never observed half-applied.
    pub fn get_level(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> LedgerResult<StockLevel> {
        let key = LevelKey::new(product_id, warehouse_id);
        let _guard = self.locks.acquire(&[key], self.lock_timeout)?;
        self.levels.get(key)
    }

    /// Consistent snapshot of several levels: all keys are held for the
    /// duration of the read, so no in-flight movement is visible with one
    /// leg applied and the other not.
    pub fn get_levels(&self, keys: &[LevelKey]) -> LedgerResult<Vec<StockLevel>> {
        let _guard = self.locks.acquire(keys, self.lock_timeout)?;
        keys.iter().map(|key| self.levels.get(*key)).collect()
    }

    /// Quantity on hand for one (product, warehouse) key.
    pub fn get_availability(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> LedgerResult<Decimal> {
        Ok(self.get_level(product_id, warehouse_id)?.quantity)
    }

    /// Movements matching `filter`, newest first.
    pub fn list_movements(&self, filter: &MovementFilter) -> LedgerResult<Vec<StockMovement>> {
        self.movements.query(filter)
    }

    /// Whether the catalog tracks stock for this product. Exists so callers
    /// batching on the ledger's behalf (the sales adapter) can bypass
    /// non-stockable lines instead of failing the whole batch. An unknown
    /// product is a validation error, not a bypass.
    pub fn is_stockable(&self, product_id: ProductId) -> LedgerResult<bool> {
        let info = self
            .catalog
            .lookup(product_id)?
            .ok_or_else(|| LedgerError::validation(format!("unknown product {product_id}")))?;
        Ok(info.stockable)
    }

    fn validate(&self, command: &MovementCommand) -> LedgerResult<()> {
        command.validate_shape()?;

        let product_id = command.product_id();
        let product = self
            .catalog
            .lookup(product_id)?
            .ok_or_else(|| LedgerError::validation(format!("unknown product {product_id}")))?;
        if !product.stockable {
            return Err(LedgerError::ProductNotStockable(product_id));
        }

        for warehouse_id in command.warehouses() {
            let warehouse = self.registry.lookup(warehouse_id)?.ok_or_else(|| {
                LedgerError::validation(format!("unknown warehouse {warehouse_id}"))
            })?;
            if !warehouse.is_active() {
                return Err(LedgerError::WarehouseInactive(warehouse_id));
            }
        }

        Ok(())
    }

    fn restore(&self, originals: &[(LevelKey, Option<StockLevel>)]) {
        let kept: Vec<StockLevel> = originals
            .iter()
            .filter_map(|(_, level)| level.clone())
            .collect();
        let created: Vec<LevelKey> = originals
            .iter()
            .filter(|(_, level)| level.is_none())
            .map(|(key, _)| *key)
            .collect();

        if let Err(err) = self.levels.put_many(&kept) {
            tracing::error!(
                error = %err,
                "rollback write failed; level store may be inconsistent"
            );
        }
        if let Err(err) = self.levels.remove(&created) {
            tracing::error!(
                error = %err,
                "rollback cleanup failed; level store may be inconsistent"
            );
        }
    }
}

/// Apply one command's effect to the working set and produce its draft row
/// plus the level snapshot(s) as of this command.
fn fold_command(
    command: &MovementCommand,
    working: &mut HashMap<LevelKey, StockLevel>,
    now: DateTime<Utc>,
) -> LedgerResult<(MovementDraft, Vec<StockLevel>)> {
    let meta = command.meta().clone();
    let base = |kind: MovementKind, quantity: Decimal| MovementDraft {
        product_id: command.product_id(),
        kind,
        quantity,
        warehouse_from_id: None,
        warehouse_to_id: None,
        unit_cost: None,
        reason: meta.reason.clone(),
        reference_kind: meta.reference_kind,
        reference_number: meta.reference_number.clone(),
        notes: meta.notes.clone(),
        created_by: meta.created_by,
    };

    match command {
        MovementCommand::Receive(c) => {
            let key = LevelKey::new(c.product_id, c.warehouse_to);
            let next = level_at(working, key).receive(c.quantity, c.unit_cost, now);
            working.insert(key, next.clone());

            let mut draft = base(MovementKind::In, c.quantity);
            draft.warehouse_to_id = Some(c.warehouse_to);
            draft.unit_cost = Some(c.unit_cost);
            Ok((draft, vec![next]))
        }

        MovementCommand::Issue(c) => {
            let key = LevelKey::new(c.product_id, c.warehouse_from);
            let next = level_at(working, key).issue(c.quantity, now)?;
            working.insert(key, next.clone());

            let mut draft = base(MovementKind::Out, c.quantity);
            draft.warehouse_from_id = Some(c.warehouse_from);
            Ok((draft, vec![next]))
        }

        MovementCommand::Transfer(c) => {
            let from_key = LevelKey::new(c.product_id, c.warehouse_from);
            let to_key = LevelKey::new(c.product_id, c.warehouse_to);

            // Both legs or neither: the issue is checked first, and both
            // writes land in the working set before anything is persisted.
            let from_next = level_at(working, from_key).issue(c.quantity, now)?;
            let inherited_cost = from_next.average_cost;
            let to_next = level_at(working, to_key).receive(c.quantity, inherited_cost, now);

            working.insert(from_key, from_next.clone());
            working.insert(to_key, to_next.clone());

            let mut draft = base(MovementKind::Transfer, c.quantity);
            draft.warehouse_from_id = Some(c.warehouse_from);
            draft.warehouse_to_id = Some(c.warehouse_to);
            // Receiving leg is priced at the source's average.
            draft.unit_cost = Some(inherited_cost);
            Ok((draft, vec![from_next, to_next]))
        }

        MovementCommand::Adjust(c) => {
            let key = LevelKey::new(c.product_id, c.warehouse_id);
            let next = level_at(working, key).adjust(c.delta, now)?;
            working.insert(key, next.clone());

            let mut draft = base(MovementKind::Adjustment, c.delta.abs());
            if c.delta > Decimal::ZERO {
                draft.warehouse_to_id = Some(c.warehouse_id);
            } else {
                draft.warehouse_from_id = Some(c.warehouse_id);
            }
            Ok((draft, vec![next]))
        }
    }
}

fn level_at(working: &HashMap<LevelKey, StockLevel>, key: LevelKey) -> StockLevel {
    working
        .get(&key)
        .cloned()
        .unwrap_or_else(|| StockLevel::empty(key))
}
