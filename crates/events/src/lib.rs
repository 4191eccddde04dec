//! `stockpile-events` — commit notification fan-out.
//!
//! The ledger's transactional core never pushes state at read-side consumers;
//! it publishes one signal per committed movement on a bus, and any number of
//! independent observers subscribe. Observers that want current state re-read
//! it through the ledger's query API — the bus carries notifications, not a
//! cache.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
