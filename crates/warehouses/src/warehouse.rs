use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerError, WarehouseId};

/// Physical role of a warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    /// Customer-facing store with sellable stock.
    Store,
    /// Back-office depot feeding the stores.
    Depot,
}

/// Warehouse record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub city: String,
    pub kind: WarehouseKind,
    /// Inactive warehouses keep their history but reject new movements.
    pub active: bool,
}

impl Warehouse {
    pub fn new(
        id: WarehouseId,
        name: impl Into<String>,
        city: impl Into<String>,
        kind: WarehouseKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            city: city.into(),
            kind,
            active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Read-only registry lookup consumed by the ledger.
pub trait WarehouseRegistry: Send + Sync {
    fn lookup(&self, warehouse_id: WarehouseId) -> Result<Option<Warehouse>, LedgerError>;
}

impl<R> WarehouseRegistry for Arc<R>
where
    R: WarehouseRegistry + ?Sized,
{
    fn lookup(&self, warehouse_id: WarehouseId) -> Result<Option<Warehouse>, LedgerError> {
        (**self).lookup(warehouse_id)
    }
}
