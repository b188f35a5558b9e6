//! Inventory domain module.
//!
//! This crate contains the business rules of the stock ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage): the
//! item projection, the append-only stock event record, the closed reason
//! enumeration, and the decision logic that validates a requested change
//! and computes its outcome.

pub mod event;
pub mod item;
pub mod reason;

pub use event::{sort_chronologically, PendingStockEvent, StockEvent};
pub use item::{ChangeOutcome, Item, ItemUpdate, NewItem, StockChange, DEFAULT_MINIMUM_QUANTITY};
pub use reason::StockChangeReason;
