use std::collections::HashMap;
use std::sync::RwLock;

use stockledger_core::ItemId;
use stockledger_inventory::{Item, PendingStockEvent, StockEvent};

use crate::query::{EventFilter, EventQueryResult, Pagination};

use super::r#trait::{LedgerStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<ItemId, Item>,
    /// Append-only, in commit order. Mirrors the `(timestamp)` index of a
    /// SQL layout.
    events: Vec<StockEvent>,
    /// Per-item positions into `events`, the `(item_id, timestamp)` index.
    by_item: HashMap<ItemId, Vec<usize>>,
    next_sequence: u64,
}

/// In-memory ledger store.
///
/// Both relations live behind one `RwLock`: a commit takes the write lock,
/// so the appended event and the updated projection become visible in the
/// same instant, and readers holding the read lock see a consistent
/// snapshot. Intended for tests/dev and as the reference implementation of
/// the commit contract.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(inner.items.get(&id).cloned())
    }

    fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(inner
            .items
            .values()
            .find(|i| i.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(inner.items.values().cloned().collect())
    }

    fn events_for_item(&self, id: ItemId) -> Result<Vec<StockEvent>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let mut stream: Vec<StockEvent> = inner
            .by_item
            .get(&id)
            .map(|positions| positions.iter().map(|&p| inner.events[p].clone()).collect())
            .unwrap_or_default();
        // Commit order already matches per-item chronological order, but
        // the contract is (occurred_at, sequence), so sort on the way out.
        stream.sort_by_key(StockEvent::chronological_key);
        Ok(stream)
    }

    fn query_events(
        &self,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> Result<EventQueryResult, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;

        let mut matches: Vec<StockEvent> = inner
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matches.sort_by_key(StockEvent::chronological_key);
        matches.reverse(); // newest first

        let total = matches.len() as u64;
        let offset = pagination.offset as usize;
        let limit = pagination.limit as usize;
        let events: Vec<StockEvent> = matches.into_iter().skip(offset).take(limit).collect();
        let has_more = (offset + events.len()) < total as usize;

        Ok(EventQueryResult {
            events,
            total,
            pagination,
            has_more,
        })
    }

    fn insert_item(&self, item: Item) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        if inner.items.contains_key(&item.id) {
            return Err(StoreError::DuplicateItem(item.id));
        }
        inner.items.insert(item.id, item);
        Ok(())
    }

    fn update_item(&self, item: Item) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        if !inner.items.contains_key(&item.id) {
            return Err(StoreError::invalid_commit(format!(
                "update of unknown item {}",
                item.id
            )));
        }
        inner.items.insert(item.id, item);
        Ok(())
    }

    fn commit(&self, item: Item, event: PendingStockEvent) -> Result<StockEvent, StoreError> {
        if event.item_id != item.id {
            return Err(StoreError::invalid_commit(format!(
                "event targets item {}, projection row is {}",
                event.item_id, item.id
            )));
        }
        if event.resulting_quantity < 0 {
            return Err(StoreError::invalid_commit(
                "resulting quantity cannot be negative".to_string(),
            ));
        }
        if event.resulting_quantity != item.quantity {
            return Err(StoreError::invalid_commit(format!(
                "event resulting quantity {} disagrees with projection quantity {}",
                event.resulting_quantity, item.quantity
            )));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;

        inner.next_sequence += 1;
        let committed = event.into_committed(inner.next_sequence);

        let position = inner.events.len();
        inner.events.push(committed.clone());
        inner
            .by_item
            .entry(committed.item_id)
            .or_default()
            .push(position);
        inner.items.insert(item.id, item);

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use stockledger_core::{StockEventId, SupplierId};
    use stockledger_inventory::StockChangeReason;

    fn seed_item(quantity: i64) -> Item {
        Item {
            id: ItemId::new(),
            name: "Widget".to_string(),
            quantity,
            unit_price: dec!(10.00),
            supplier_id: SupplierId::new(),
            minimum_quantity: 10,
            created_by: "tester@example.com".to_string(),
            created_at: Utc::now(),
            disabled: false,
        }
    }

    fn pending(item: &Item, delta: i64, resulting: i64) -> PendingStockEvent {
        PendingStockEvent {
            id: StockEventId::new(),
            item_id: item.id,
            supplier_id: item.supplier_id,
            quantity_delta: delta,
            resulting_quantity: resulting,
            reason: if delta >= 0 {
                StockChangeReason::Received
            } else {
                StockChangeReason::Sold
            },
            price_at_change: Some(item.unit_price),
            recorded_by: "tester@example.com".to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn commit_makes_event_and_projection_visible_together() {
        let store = InMemoryLedgerStore::new();
        let mut item = seed_item(0);
        store.insert_item(item.clone()).unwrap();

        item.quantity = 100;
        let committed = store.commit(item.clone(), pending(&item, 100, 100)).unwrap();

        assert_eq!(committed.sequence, 1);
        assert_eq!(store.get_item(item.id).unwrap().unwrap().quantity, 100);
        assert_eq!(store.events_for_item(item.id).unwrap().len(), 1);
    }

    #[test]
    fn commit_assigns_gap_free_sequences() {
        let store = InMemoryLedgerStore::new();
        let mut item = seed_item(0);
        store.insert_item(item.clone()).unwrap();

        for step in 1..=5i64 {
            item.quantity += 1;
            let committed = store.commit(item.clone(), pending(&item, 1, item.quantity)).unwrap();
            assert_eq!(committed.sequence, step as u64);
        }
    }

    #[test]
    fn commit_rejects_mismatched_payload() {
        let store = InMemoryLedgerStore::new();
        let item = seed_item(5);
        store.insert_item(item.clone()).unwrap();

        let bad = pending(&item, 1, 7); // disagrees with item.quantity
        let err = store.commit(item.clone(), bad).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCommit(_)));
        // Nothing was applied.
        assert!(store.events_for_item(item.id).unwrap().is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let store = InMemoryLedgerStore::new();
        let item = seed_item(0);
        store.insert_item(item.clone()).unwrap();
        assert!(matches!(
            store.insert_item(item).unwrap_err(),
            StoreError::DuplicateItem(_)
        ));
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let store = InMemoryLedgerStore::new();
        store.insert_item(seed_item(0)).unwrap();
        assert!(store.find_item_by_name("wIdGeT").unwrap().is_some());
        assert!(store.find_item_by_name("missing").unwrap().is_none());
    }

    #[test]
    fn query_paginates_newest_first() {
        let store = InMemoryLedgerStore::new();
        let mut item = seed_item(0);
        store.insert_item(item.clone()).unwrap();

        for _ in 0..7 {
            item.quantity += 1;
            store.commit(item.clone(), pending(&item, 1, item.quantity)).unwrap();
        }

        let page = store
            .query_events(
                &EventFilter::for_item(item.id),
                Pagination { limit: 3, offset: 0 },
            )
            .unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.events.len(), 3);
        assert!(page.has_more);
        // Newest first means descending sequence.
        assert_eq!(page.events[0].sequence, 7);

        let last_page = store
            .query_events(
                &EventFilter::for_item(item.id),
                Pagination { limit: 3, offset: 6 },
            )
            .unwrap();
        assert_eq!(last_page.events.len(), 1);
        assert!(!last_page.has_more);
    }
}
