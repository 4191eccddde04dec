//! Black-box tests of the ledger engine over the in-memory infrastructure.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::world;
use stockpile_core::LedgerError;
use stockpile_events::EventBus;
use stockpile_ledger::{MovementFilter, MovementKind, ReferenceKind};

#[test]
fn end_to_end_receipt_issue_transfer_and_rejection() {
    let w = world();
    let product = w.stockable_product("BEAN-01");
    let w1 = w.store("W1");
    let w2 = w.depot("W2");

    // W1 starts at zero.
    assert_eq!(w.ledger.get_availability(product, w1).unwrap(), dec!(0));

    // IN 100 @ 10.
    w.ledger.apply(w.receive(product, w1, dec!(100), dec!(10))).unwrap();
    let level = w.ledger.get_level(product, w1).unwrap();
    assert_eq!(level.quantity, dec!(100));
    assert_eq!(level.average_cost, dec!(10));

    // OUT 30.
    w.ledger.apply(w.issue(product, w1, dec!(30))).unwrap();
    let level = w.ledger.get_level(product, w1).unwrap();
    assert_eq!(level.quantity, dec!(70));
    assert_eq!(level.average_cost, dec!(10));

    // TRANSFER 20 W1 -> W2.
    w.ledger.apply(w.transfer(product, w1, w2, dec!(20))).unwrap();
    assert_eq!(w.ledger.get_availability(product, w1).unwrap(), dec!(50));
    let dest = w.ledger.get_level(product, w2).unwrap();
    assert_eq!(dest.quantity, dec!(20));
    assert_eq!(dest.average_cost, dec!(10));

    // OUT 999 is rejected; W1 unchanged.
    let err = w.ledger.apply(w.issue(product, w1, dec!(999))).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientStock {
            requested: dec!(999),
            available: dec!(50),
        }
    );
    assert_eq!(w.ledger.get_availability(product, w1).unwrap(), dec!(50));
}

#[test]
fn rejected_transfer_changes_neither_leg() {
    let w = world();
    let product = w.stockable_product("BEAN-02");
    let from = w.store("from");
    let to = w.store("to");

    w.ledger.apply(w.receive(product, from, dec!(5), dec!(1))).unwrap();
    let rows_before = w.log.len();

    let err = w
        .ledger
        .apply(w.transfer(product, from, to, dec!(6)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { .. }));

    assert_eq!(w.ledger.get_availability(product, from).unwrap(), dec!(5));
    assert_eq!(w.ledger.get_availability(product, to).unwrap(), dec!(0));
    assert_eq!(w.log.len(), rows_before);
}

#[test]
fn transfer_into_stocked_destination_reweights_the_average() {
    let w = world();
    let product = w.stockable_product("BEAN-03");
    let depot = w.depot("depot");
    let store = w.store("store");

    // Depot holds 10 @ 4; store holds 10 @ 8.
    w.ledger.apply(w.receive(product, depot, dec!(10), dec!(4))).unwrap();
    w.ledger.apply(w.receive(product, store, dec!(10), dec!(8))).unwrap();

    // Moving 10 from the depot re-weights the store: (10*8 + 10*4) / 20 = 6.
    w.ledger.apply(w.transfer(product, depot, store, dec!(10))).unwrap();

    let level = w.ledger.get_level(product, store).unwrap();
    assert_eq!(level.quantity, dec!(20));
    assert_eq!(level.average_cost, dec!(6));
}

#[test]
fn inactive_warehouse_rejects_new_movements() {
    let w = world();
    let product = w.stockable_product("BEAN-04");
    let warehouse = w.store("closing");

    w.ledger.apply(w.receive(product, warehouse, dec!(10), dec!(1))).unwrap();
    w.registry.deactivate(warehouse);

    let err = w.ledger.apply(w.issue(product, warehouse, dec!(1))).unwrap_err();
    assert_eq!(err, LedgerError::WarehouseInactive(warehouse));

    // History survives deactivation.
    assert_eq!(w.ledger.get_availability(product, warehouse).unwrap(), dec!(10));
    assert_eq!(w.log.len(), 1);
}

#[test]
fn non_stockable_product_bypasses_the_ledger() {
    let w = world();
    let service = w.service_product("GIFTWRAP");
    let warehouse = w.store("main");

    let err = w
        .ledger
        .apply(w.receive(service, warehouse, dec!(1), dec!(1)))
        .unwrap_err();
    assert_eq!(err, LedgerError::ProductNotStockable(service));
    assert!(w.log.is_empty());
}

#[test]
fn adjustments_shift_quantity_without_touching_cost() {
    let w = world();
    let product = w.stockable_product("BEAN-05");
    let warehouse = w.store("main");

    w.ledger.apply(w.receive(product, warehouse, dec!(10), dec!(3))).unwrap();

    // Found two extra units during a cycle count.
    w.ledger.apply(w.adjust(product, warehouse, dec!(2))).unwrap();
    let level = w.ledger.get_level(product, warehouse).unwrap();
    assert_eq!(level.quantity, dec!(12));
    assert_eq!(level.average_cost, dec!(3));

    // Write off five damaged units.
    w.ledger.apply(w.adjust(product, warehouse, dec!(-5))).unwrap();
    let level = w.ledger.get_level(product, warehouse).unwrap();
    assert_eq!(level.quantity, dec!(7));
    assert_eq!(level.average_cost, dec!(3));

    // An adjustment may not drive the level negative.
    let err = w.ledger.apply(w.adjust(product, warehouse, dec!(-8))).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    assert_eq!(w.ledger.get_availability(product, warehouse).unwrap(), dec!(7));
}

#[test]
fn concurrent_issues_never_oversell_or_lose_updates() {
    let w = world();
    let product = w.stockable_product("BEAN-06");
    let warehouse = w.store("main");
    w.ledger.apply(w.receive(product, warehouse, dec!(10), dec!(1))).unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let ledger = Arc::clone(&w.ledger);
        let cmd = w.issue(product, warehouse, dec!(6));
        handles.push(thread::spawn(move || ledger.apply(cmd)));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientStock { .. })))
        .count();

    // Exactly one succeeds; the loser sees the post-commit balance.
    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(w.ledger.get_availability(product, warehouse).unwrap(), dec!(4));
}

#[test]
fn opposite_direction_transfers_never_deadlock() {
    let w = world();
    let product = w.stockable_product("BEAN-07");
    let a = w.store("a");
    let b = w.store("b");

    w.ledger.apply(w.receive(product, a, dec!(1000), dec!(1))).unwrap();
    w.ledger.apply(w.receive(product, b, dec!(1000), dec!(1))).unwrap();

    let mut handles = Vec::new();
    for (from, to) in [(a, b), (b, a)] {
        let ledger = Arc::clone(&w.ledger);
        let cmd = w.transfer(product, from, to, dec!(1));
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                ledger.apply(cmd.clone()).unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // Equal traffic both ways: balances end where they started.
    assert_eq!(w.ledger.get_availability(product, a).unwrap(), dec!(1000));
    assert_eq!(w.ledger.get_availability(product, b).unwrap(), dec!(1000));
}

#[test]
fn movements_on_disjoint_keys_all_commit() {
    let w = world();
    let warehouse = w.store("main");

    let mut handles = Vec::new();
    for i in 0..8 {
        let product = w.stockable_product(&format!("SKU-{i}"));
        let ledger = Arc::clone(&w.ledger);
        let cmd = w.receive(product, warehouse, dec!(1), dec!(1));
        handles.push(thread::spawn(move || ledger.apply(cmd)));
    }

    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(w.log.len(), 8);
}

#[test]
fn committed_movements_are_published_and_rejections_are_not() {
    let w = world();
    let product = w.stockable_product("BEAN-08");
    let warehouse = w.store("main");
    let subscription = w.bus.subscribe();

    w.ledger.apply(w.receive(product, warehouse, dec!(3), dec!(2))).unwrap();

    let notice = subscription.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(notice.movement.kind, MovementKind::In);
    assert_eq!(notice.movement.quantity, dec!(3));
    assert_eq!(notice.levels.len(), 1);
    assert_eq!(notice.levels[0].quantity, dec!(3));

    // A rejected command publishes nothing.
    let _ = w.ledger.apply(w.issue(product, warehouse, dec!(99))).unwrap_err();
    assert!(subscription.try_recv().is_err());
}

#[test]
fn queries_filter_and_return_newest_first() {
    let w = world();
    let product = w.stockable_product("BEAN-09");
    let other = w.stockable_product("BEAN-10");
    let w1 = w.store("w1");
    let w2 = w.depot("w2");

    w.ledger.apply(w.receive(product, w1, dec!(10), dec!(1))).unwrap();
    w.ledger.apply(w.receive(other, w1, dec!(5), dec!(1))).unwrap();
    w.ledger.apply(w.transfer(product, w1, w2, dec!(4))).unwrap();
    w.ledger.apply(w.issue(product, w2, dec!(1))).unwrap();

    // By product.
    let rows = w
        .ledger
        .list_movements(&MovementFilter::for_product(product))
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|p| p[0].created_at >= p[1].created_at));
    assert_eq!(rows[0].kind, MovementKind::Out);

    // By warehouse: the transfer shows up for both sides.
    let rows = w
        .ledger
        .list_movements(&MovementFilter::default().in_warehouse(w2))
        .unwrap();
    assert_eq!(rows.len(), 2);

    // By kind + limit.
    let rows = w
        .ledger
        .list_movements(
            &MovementFilter::for_product(product)
                .of_kind(MovementKind::In)
                .newest(1),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, dec!(10));

    // By reference kind: everything here was manual.
    let rows = w
        .ledger
        .list_movements(&MovementFilter::default().with_reference_kind(ReferenceKind::Sale))
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn ledger_replay_reconstructs_every_level() {
    let w = world();
    let product = w.stockable_product("BEAN-11");
    let w1 = w.store("w1");
    let w2 = w.depot("w2");

    w.ledger.apply(w.receive(product, w1, dec!(50), dec!(2))).unwrap();
    w.ledger.apply(w.transfer(product, w1, w2, dec!(20))).unwrap();
    w.ledger.apply(w.issue(product, w2, dec!(5))).unwrap();
    w.ledger.apply(w.adjust(product, w1, dec!(-3))).unwrap();
    w.ledger.apply(w.adjust(product, w2, dec!(1.5))).unwrap();

    for warehouse in [w1, w2] {
        let rows = w
            .ledger
            .list_movements(&MovementFilter::for_product(product).in_warehouse(warehouse))
            .unwrap();
        let replayed: Decimal = rows.iter().map(|m| m.signed_delta_for(warehouse)).sum();
        assert_eq!(
            replayed,
            w.ledger.get_availability(product, warehouse).unwrap()
        );
    }
}
