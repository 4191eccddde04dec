//! In-memory implementations of the ledger's storage and collaborator traits.
//!
//! Intended for tests/dev. Not optimized for performance; correctness of the
//! trait contracts (zero-level reads, atomic batch append, newest-first
//! queries) is what matters here.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use stockpile_core::{LedgerError, LedgerResult, MovementId, ProductId, WarehouseId};
use stockpile_ledger::{
    LevelKey, MovementDraft, MovementFilter, MovementLedger, StockLevel, StockLevelStore,
    StockMovement,
};
use stockpile_products::{ProductCatalog, ProductInfo};
use stockpile_warehouses::{Warehouse, WarehouseRegistry};

/// In-memory stock level store.
#[derive(Debug, Default)]
pub struct InMemoryStockLevelStore {
    levels: RwLock<HashMap<LevelKey, StockLevel>>,
}

impl InMemoryStockLevelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels currently materialized (zero balances included).
    pub fn all(&self) -> Vec<StockLevel> {
        match self.levels.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl StockLevelStore for InMemoryStockLevelStore {
    fn find(&self, key: LevelKey) -> LedgerResult<Option<StockLevel>> {
        let map = self
            .levels
            .read()
            .map_err(|_| LedgerError::storage("level store lock poisoned"))?;
        Ok(map.get(&key).cloned())
    }

    fn put(&self, level: StockLevel) -> LedgerResult<()> {
        let mut map = self
            .levels
            .write()
            .map_err(|_| LedgerError::storage("level store lock poisoned"))?;
        map.insert(level.key(), level);
        Ok(())
    }

    /// All levels land under one write lock: a reader sees the whole commit
    /// or none of it.
    fn put_many(&self, levels: &[StockLevel]) -> LedgerResult<()> {
        let mut map = self
            .levels
            .write()
            .map_err(|_| LedgerError::storage("level store lock poisoned"))?;
        for level in levels {
            map.insert(level.key(), level.clone());
        }
        Ok(())
    }

    fn remove(&self, keys: &[LevelKey]) -> LedgerResult<()> {
        let mut map = self
            .levels
            .write()
            .map_err(|_| LedgerError::storage("level store lock poisoned"))?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}

/// In-memory append-only movement log.
#[derive(Debug, Default)]
pub struct InMemoryMovementLedger {
    rows: RwLock<Vec<StockMovement>>,
}

impl InMemoryMovementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MovementLedger for InMemoryMovementLedger {
    fn append(&self, draft: MovementDraft) -> LedgerResult<StockMovement> {
        let mut committed = self.append_batch(vec![draft])?;
        committed
            .pop()
            .ok_or_else(|| LedgerError::storage("append produced no row"))
    }

    /// All drafts land under one write lock: either the whole batch is in the
    /// log or none of it is.
    fn append_batch(&self, drafts: Vec<MovementDraft>) -> LedgerResult<Vec<StockMovement>> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::storage("movement log lock poisoned"))?;

        let now = Utc::now();
        let committed: Vec<StockMovement> = drafts
            .into_iter()
            .map(|draft| draft.into_movement(MovementId::new(), now))
            .collect();

        rows.extend(committed.iter().cloned());
        Ok(committed)
    }

    fn query(&self, filter: &MovementFilter) -> LedgerResult<Vec<StockMovement>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::storage("movement log lock poisoned"))?;

        let mut matched: Vec<StockMovement> =
            rows.iter().filter(|m| filter.matches(m)).cloned().collect();

        // Newest first; ids break ties between rows committed in the same
        // batch (which share one timestamp).
        matched.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}

/// In-memory product catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, ProductInfo>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: ProductInfo) {
        if let Ok(mut map) = self.products.write() {
            map.insert(product.id, product);
        }
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn lookup(&self, product_id: ProductId) -> LedgerResult<Option<ProductInfo>> {
        let map = self
            .products
            .read()
            .map_err(|_| LedgerError::storage("catalog lock poisoned"))?;
        Ok(map.get(&product_id).cloned())
    }
}

/// In-memory warehouse registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseRegistry {
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
}

impl InMemoryWarehouseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, warehouse: Warehouse) {
        if let Ok(mut map) = self.warehouses.write() {
            map.insert(warehouse.id, warehouse);
        }
    }

    /// Flip a warehouse inactive (it keeps history, rejects new movements).
    pub fn deactivate(&self, warehouse_id: WarehouseId) {
        if let Ok(mut map) = self.warehouses.write() {
            if let Some(w) = map.get_mut(&warehouse_id) {
                w.active = false;
            }
        }
    }
}

impl WarehouseRegistry for InMemoryWarehouseRegistry {
    fn lookup(&self, warehouse_id: WarehouseId) -> LedgerResult<Option<Warehouse>> {
        let map = self
            .warehouses
            .read()
            .map_err(|_| LedgerError::storage("registry lock poisoned"))?;
        Ok(map.get(&warehouse_id).cloned())
    }
}
