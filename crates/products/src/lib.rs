//! Product catalog contract.
//!
//! The catalog is an external collaborator; the ledger only needs to know
//! whether a product exists and whether it is stockable. Non-stockable
//! products (services, fees, shipping lines) bypass the ledger entirely.

pub mod catalog;

pub use catalog::{ProductCatalog, ProductInfo};
