use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stockpile_core::{LedgerError, ProductId};

/// The slice of a product record the ledger cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    /// Whether quantity on hand is tracked for this product.
    pub stockable: bool,
}

impl ProductInfo {
    pub fn new(id: ProductId, sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            sku: sku.into(),
            name: name.into(),
            stockable: true,
        }
    }

    pub fn non_stockable(id: ProductId, sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stockable: false,
            ..Self::new(id, sku, name)
        }
    }
}

/// Read-only catalog lookup consumed by the ledger.
///
/// `Ok(None)` means the product does not exist; the caller decides whether
/// that is a validation failure (the applier treats it as one).
pub trait ProductCatalog: Send + Sync {
    fn lookup(&self, product_id: ProductId) -> Result<Option<ProductInfo>, LedgerError>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn lookup(&self, product_id: ProductId) -> Result<Option<ProductInfo>, LedgerError> {
        (**self).lookup(product_id)
    }
}
