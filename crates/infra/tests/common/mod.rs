//! Shared fixture for black-box ledger tests: a fully in-memory world.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;

use stockpile_core::{ProductId, UserId, WarehouseId};
use stockpile_events::InMemoryEventBus;
use stockpile_infra::{
    InMemoryMovementLedger, InMemoryProductCatalog, InMemoryStockLevelStore,
    InMemoryWarehouseRegistry,
};
use stockpile_ledger::{
    AdjustStock, IssueStock, MovementCommand, MovementCommitted, MovementMeta, ReceiveStock,
    StockLedger, TransferStock,
};
use stockpile_products::ProductInfo;
use stockpile_warehouses::{Warehouse, WarehouseKind};

pub type TestLedger = StockLedger<
    Arc<InMemoryProductCatalog>,
    Arc<InMemoryWarehouseRegistry>,
    Arc<InMemoryStockLevelStore>,
    Arc<InMemoryMovementLedger>,
    Arc<InMemoryEventBus<MovementCommitted>>,
>;

pub struct World {
    pub ledger: Arc<TestLedger>,
    pub catalog: Arc<InMemoryProductCatalog>,
    pub registry: Arc<InMemoryWarehouseRegistry>,
    pub levels: Arc<InMemoryStockLevelStore>,
    pub log: Arc<InMemoryMovementLedger>,
    pub bus: Arc<InMemoryEventBus<MovementCommitted>>,
    pub user: UserId,
}

pub fn world() -> World {
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let registry = Arc::new(InMemoryWarehouseRegistry::new());
    let levels = Arc::new(InMemoryStockLevelStore::new());
    let log = Arc::new(InMemoryMovementLedger::new());
    let bus = Arc::new(InMemoryEventBus::new());

    let ledger = Arc::new(StockLedger::new(
        Arc::clone(&catalog),
        Arc::clone(&registry),
        Arc::clone(&levels),
        Arc::clone(&log),
        Arc::clone(&bus),
    ));

    World {
        ledger,
        catalog,
        registry,
        levels,
        log,
        bus,
        user: UserId::new(),
    }
}

impl World {
    pub fn stockable_product(&self, sku: &str) -> ProductId {
        let id = ProductId::new();
        self.catalog.insert(ProductInfo::new(id, sku, sku));
        id
    }

    pub fn service_product(&self, sku: &str) -> ProductId {
        let id = ProductId::new();
        self.catalog.insert(ProductInfo::non_stockable(id, sku, sku));
        id
    }

    pub fn store(&self, name: &str) -> WarehouseId {
        let id = WarehouseId::new();
        self.registry
            .insert(Warehouse::new(id, name, "Lisbon", WarehouseKind::Store));
        id
    }

    pub fn depot(&self, name: &str) -> WarehouseId {
        let id = WarehouseId::new();
        self.registry
            .insert(Warehouse::new(id, name, "Porto", WarehouseKind::Depot));
        id
    }

    pub fn meta(&self, reason: &str) -> MovementMeta {
        MovementMeta::manual(reason, self.user)
    }

    pub fn receive(
        &self,
        product: ProductId,
        warehouse: WarehouseId,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> MovementCommand {
        MovementCommand::Receive(ReceiveStock {
            product_id: product,
            warehouse_to: warehouse,
            quantity,
            unit_cost,
            meta: self.meta("goods receipt"),
        })
    }

    pub fn issue(
        &self,
        product: ProductId,
        warehouse: WarehouseId,
        quantity: Decimal,
    ) -> MovementCommand {
        MovementCommand::Issue(IssueStock {
            product_id: product,
            warehouse_from: warehouse,
            quantity,
            meta: self.meta("manual issue"),
        })
    }

    pub fn transfer(
        &self,
        product: ProductId,
        from: WarehouseId,
        to: WarehouseId,
        quantity: Decimal,
    ) -> MovementCommand {
        MovementCommand::Transfer(TransferStock {
            product_id: product,
            warehouse_from: from,
            warehouse_to: to,
            quantity,
            meta: self.meta("restock transfer"),
        })
    }

    pub fn adjust(
        &self,
        product: ProductId,
        warehouse: WarehouseId,
        delta: Decimal,
    ) -> MovementCommand {
        MovementCommand::Adjust(AdjustStock {
            product_id: product,
            warehouse_id: warehouse,
            delta,
            meta: self.meta("cycle count correction"),
        })
    }
}
