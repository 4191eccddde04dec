//! Sale integration adapter.
//!
//! Turns a multi-line sale (a checkout cart) into a batch of issue movements
//! with all-or-nothing semantics: if any line fails its stock check, no line
//! is persisted. Non-stockable lines (services, fees) bypass the ledger.

pub mod adapter;

pub use adapter::{RecordedSale, Sale, SaleLine, SalesAdapter};
