//! The ledger's storage boundary.
//!
//! One consistent store holds both relations (item projection + event
//! ledger) so a commit can make the event and the projection update
//! observable together, never separately.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerStore, StoreError};
