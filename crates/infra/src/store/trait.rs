use thiserror::Error;

use std::sync::Arc;

use stockledger_core::ItemId;
use stockledger_inventory::{Item, PendingStockEvent, StockEvent};

use crate::query::{EventFilter, EventQueryResult, Pagination};

/// Store operation error.
///
/// These are **infrastructure errors** (locking, consistency of the commit
/// itself) as opposed to domain errors (validation, invariants). A failed
/// commit leaves no partial state, so `Unavailable` is safe to retry.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or its lock was poisoned. Transient;
    /// retrying is safe because commits are all-or-nothing.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An item row with this id already exists.
    #[error("duplicate item: {0}")]
    DuplicateItem(ItemId),

    /// The commit payload is internally inconsistent (wrong item id on the
    /// event, negative resulting quantity). Indicates a caller bug, not a
    /// business-rule failure.
    #[error("invalid commit: {0}")]
    InvalidCommit(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_commit(msg: impl Into<String>) -> Self {
        Self::InvalidCommit(msg.into())
    }
}

/// Single consistent store for the two ledger relations.
///
/// ## Write surface
///
/// Exactly three mutations exist, all reserved for the ledger service:
///
/// - `insert_item`: create a projection row (item lifecycle)
/// - `update_item`: overwrite projection metadata (rename, supplier
///   reassignment, threshold change, disable flag)
/// - `commit`: atomically append one event **and** apply the updated
///   projection row; one must never be observable without the other
///
/// There is deliberately no way to update or delete an event: the event
/// relation is insert-only at the interface level, not merely by
/// convention.
///
/// ## Read surface
///
/// Reads are lock-free with respect to writers in the sense that they
/// never block a writer's progress indefinitely and always observe either
/// the fully pre-commit or fully post-commit state (snapshot consistency).
///
/// ## Implementation requirements
///
/// - `commit` assigns the event's `sequence` monotonically (no gaps, no
///   duplicates); this is the insertion tie-breaker for same-timestamp ordering
/// - `events_for_item` returns the stream in `(occurred_at, sequence)`
///   order, ascending
/// - `query_events` returns matches newest-first with pagination
pub trait LedgerStore: Send + Sync {
    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Case-insensitive name lookup (names are unique).
    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StoreError>;

    fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Full stream for one item in chronological order.
    fn events_for_item(&self, id: ItemId) -> Result<Vec<StockEvent>, StoreError>;

    /// Filtered query over all events, newest first.
    fn query_events(
        &self,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> Result<EventQueryResult, StoreError>;

    /// Create a projection row. Fails on duplicate id.
    fn insert_item(&self, item: Item) -> Result<(), StoreError>;

    /// Overwrite projection metadata without touching the event relation.
    fn update_item(&self, item: Item) -> Result<(), StoreError>;

    /// Append one event and apply the updated projection row as a single
    /// atomic unit. Returns the committed event with its assigned sequence.
    fn commit(&self, item: Item, event: PendingStockEvent) -> Result<StockEvent, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(id)
    }

    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StoreError> {
        (**self).find_item_by_name(name)
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_items()
    }

    fn events_for_item(&self, id: ItemId) -> Result<Vec<StockEvent>, StoreError> {
        (**self).events_for_item(id)
    }

    fn query_events(
        &self,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> Result<EventQueryResult, StoreError> {
        (**self).query_events(filter, pagination)
    }

    fn insert_item(&self, item: Item) -> Result<(), StoreError> {
        (**self).insert_item(item)
    }

    fn update_item(&self, item: Item) -> Result<(), StoreError> {
        (**self).update_item(item)
    }

    fn commit(&self, item: Item, event: PendingStockEvent) -> Result<StockEvent, StoreError> {
        (**self).commit(item, event)
    }
}
