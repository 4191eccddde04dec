use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerResult, ProductId, UserId, WarehouseId};
use stockpile_events::EventBus;
use stockpile_ledger::{
    IssueStock, MovementCommand, MovementCommitted, MovementLedger, MovementMeta, ReferenceKind,
    StockLedger, StockLevelStore,
};
use stockpile_products::ProductCatalog;
use stockpile_warehouses::WarehouseRegistry;

/// One line of a sale: product, quantity sold, unit price charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// A completed checkout to be reflected in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Warehouse the goods leave from (the selling store).
    pub warehouse_id: WarehouseId,
    pub lines: Vec<SaleLine>,
    /// Receipt/order number linking the movements back to the sale.
    pub reference_number: String,
    pub created_by: UserId,
    pub notes: Option<String>,
}

/// Outcome of recording a sale: the committed issue movements plus the lines
/// the ledger never saw because their product is not stockable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSale {
    pub committed: Vec<MovementCommitted>,
    pub skipped: Vec<SaleLine>,
}

/// Adapter between point-of-sale checkouts and the stock ledger.
///
/// Holds a reference to the ledger and issues the whole cart through
/// `apply_batch`, extending the single-movement atomicity guarantee to the
/// cart: either every stockable line becomes an OUT movement or none does.
#[derive(Debug)]
pub struct SalesAdapter<'a, C, W, L, M, B> {
    ledger: &'a StockLedger<C, W, L, M, B>,
}

impl<'a, C, W, L, M, B> SalesAdapter<'a, C, W, L, M, B>
where
    C: ProductCatalog,
    W: WarehouseRegistry,
    L: StockLevelStore,
    M: MovementLedger,
    B: EventBus<MovementCommitted>,
{
    pub fn new(ledger: &'a StockLedger<C, W, L, M, B>) -> Self {
        Self { ledger }
    }

    /// Record a sale as one atomic batch of OUT movements.
    ///
    /// Non-stockable lines are skipped (and reported back), not rejected: a
    /// cart mixing goods and services is a normal checkout, and only the
    /// goods touch stock.
    pub fn record_sale(&self, sale: Sale) -> LedgerResult<RecordedSale> {
        let mut commands = Vec::with_capacity(sale.lines.len());
        let mut skipped = Vec::new();

        for line in &sale.lines {
            if !self.ledger.is_stockable(line.product_id)? {
                skipped.push(line.clone());
                continue;
            }

            commands.push(MovementCommand::Issue(IssueStock {
                product_id: line.product_id,
                warehouse_from: sale.warehouse_id,
                quantity: line.quantity,
                meta: MovementMeta {
                    reason: format!("sale {}", sale.reference_number),
                    reference_kind: ReferenceKind::Sale,
                    reference_number: Some(sale.reference_number.clone()),
                    notes: sale.notes.clone(),
                    created_by: sale.created_by,
                },
            }));
        }

        let committed = self.ledger.apply_batch(commands)?;

        tracing::debug!(
            reference_number = %sale.reference_number,
            warehouse_id = %sale.warehouse_id,
            issued = committed.len(),
            skipped = skipped.len(),
            "sale recorded"
        );

        Ok(RecordedSale { committed, skipped })
    }
}
