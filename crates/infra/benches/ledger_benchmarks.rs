use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use rust_decimal::Decimal;

use stockpile_core::{ProductId, UserId, WarehouseId};
use stockpile_events::InMemoryEventBus;
use stockpile_infra::{
    InMemoryMovementLedger, InMemoryProductCatalog, InMemoryStockLevelStore,
    InMemoryWarehouseRegistry,
};
use stockpile_ledger::{
    IssueStock, MovementCommand, MovementCommitted, MovementFilter, MovementMeta, ReceiveStock,
    StockLedger,
};
use stockpile_products::ProductInfo;
use stockpile_warehouses::{Warehouse, WarehouseKind};

type BenchLedger = StockLedger<
    Arc<InMemoryProductCatalog>,
    Arc<InMemoryWarehouseRegistry>,
    Arc<InMemoryStockLevelStore>,
    Arc<InMemoryMovementLedger>,
    Arc<InMemoryEventBus<MovementCommitted>>,
>;

fn setup(products: usize) -> (BenchLedger, Vec<ProductId>, WarehouseId, UserId) {
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let registry = Arc::new(InMemoryWarehouseRegistry::new());
    let levels = Arc::new(InMemoryStockLevelStore::new());
    let log = Arc::new(InMemoryMovementLedger::new());
    let bus = Arc::new(InMemoryEventBus::new());

    let warehouse = WarehouseId::new();
    registry.insert(Warehouse::new(
        warehouse,
        "Bench",
        "Lisbon",
        WarehouseKind::Depot,
    ));

    let user = UserId::new();
    let ledger = StockLedger::new(catalog.clone(), registry, levels, log, bus);

    let ids: Vec<ProductId> = (0..products)
        .map(|i| {
            let id = ProductId::new();
            catalog.insert(ProductInfo::new(id, format!("SKU-{i}"), format!("Item {i}")));
            ledger
                .apply(MovementCommand::Receive(ReceiveStock {
                    product_id: id,
                    warehouse_to: warehouse,
                    quantity: Decimal::from(100_000_000_000u64),
                    unit_cost: Decimal::ONE,
                    meta: MovementMeta::manual("bench seed", user),
                }))
                .unwrap();
            id
        })
        .collect();

    (ledger, ids, warehouse, user)
}

fn issue(product: ProductId, warehouse: WarehouseId, user: UserId) -> MovementCommand {
    MovementCommand::Issue(IssueStock {
        product_id: product,
        warehouse_from: warehouse,
        quantity: Decimal::ONE,
        meta: MovementMeta::manual("bench issue", user),
    })
}

fn bench_apply_hot_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_hot_key", |b| {
        let (ledger, ids, warehouse, user) = setup(1);
        b.iter(|| {
            black_box(ledger.apply(issue(ids[0], warehouse, user)).unwrap());
        });
    });

    group.bench_function("rotating_disjoint_keys", |b| {
        let (ledger, ids, warehouse, user) = setup(64);
        let mut i = 0usize;
        b.iter(|| {
            let id = ids[i % ids.len()];
            i += 1;
            black_box(ledger.apply(issue(id, warehouse, user)).unwrap());
        });
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for rows in [100usize, 1_000, 10_000] {
        let (ledger, ids, warehouse, user) = setup(1);
        for _ in 0..rows {
            ledger.apply(issue(ids[0], warehouse, user)).unwrap();
        }

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("by_product", rows), &rows, |b, _| {
            let filter = MovementFilter::for_product(ids[0]).newest(50);
            b.iter(|| black_box(ledger.list_movements(&filter).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_apply_hot_key, bench_query);
criterion_main!(benches);
