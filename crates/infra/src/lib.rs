//! Storage seam for the stock ledger.
//!
//! Two logical relations live behind one consistent store: the mutable
//! item projection (one row per product) and the append-only stock event
//! ledger. The [`store::LedgerStore`] trait exposes reads plus exactly two
//! write operations; updating or deleting an event is not expressible at
//! the interface, so those paths cannot exist even by accident.

pub mod query;
pub mod store;

pub use query::{EventFilter, EventQueryResult, Pagination};
pub use store::{InMemoryLedgerStore, LedgerStore, StoreError};
