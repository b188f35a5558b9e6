//! Write-path orchestration.
//!
//! This module implements the ledger's only mutation pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. Acquire the per-item lock (same item: mutually exclusive;
//!    different items: fully parallel, there is no global lock)
//!   ↓
//! 2. Load the current projection row
//!   ↓
//! 3. Decide (pure domain logic: validate reason/delta/price, compute
//!    the resulting quantity, capture the price snapshot)
//!   ↓
//! 4. Commit the event and the updated projection atomically
//! ```
//!
//! A rejected request has exactly zero effect: nothing is written before
//! the decision step succeeds, and the store's commit is all-or-nothing.
//! The operation carries no idempotency key; duplicate-submission
//! protection is the caller's responsibility.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use stockledger_core::{DomainError, ItemId, StockEventId};
use stockledger_infra::{LedgerStore, StoreError};
use stockledger_inventory::{
    Item, ItemUpdate, NewItem, PendingStockEvent, StockChange, StockChangeReason, StockEvent,
};

/// Error of a ledger operation.
///
/// Domain rejections are deterministic and must not be retried as-is;
/// store failures are transient and safe to retry because commits are
/// atomic; no partial-apply error class exists.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable(_)))
    }
}

/// Orchestrates the single write path over a [`LedgerStore`].
///
/// ## Concurrency
///
/// A registry of per-item mutexes serializes the load→decide→commit
/// window for each item, which preserves the running-sum invariant and
/// the causal ordering of `resulting_quantity` values that trend queries
/// depend on. Reads go straight to the store and never take these locks.
///
/// ## Ownership
///
/// The service is the only writer of the item projection. Valuation and
/// analytics consume the store read-only.
pub struct LedgerService<S> {
    store: S,
    locks: Mutex<HashMap<ItemId, Arc<Mutex<()>>>>,
}

impl<S> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Read-only access to the underlying store (for valuation/analytics
    /// consumers wired against the same storage).
    pub fn store(&self) -> &S {
        &self.store
    }

    fn item_lock(&self, id: ItemId) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StoreError::unavailable("item lock registry poisoned"))?;
        Ok(locks.entry(id).or_default().clone())
    }
}

impl<S: LedgerStore> LedgerService<S> {
    /// Record a stock or price change for an item.
    ///
    /// Exactly one event is appended per successful call, carrying the
    /// post-change quantity and the price snapshot (explicit, or captured
    /// from the item's current price at commit time). The event append and
    /// the projection update commit together.
    #[instrument(skip(self, recorded_by), fields(%item_id, %reason), err)]
    pub fn record_change(
        &self,
        item_id: ItemId,
        delta: i64,
        reason: StockChangeReason,
        price_at_change: Option<Decimal>,
        recorded_by: &str,
    ) -> Result<StockEvent, LedgerError> {
        require_actor(recorded_by)?;

        let lock = self.item_lock(item_id)?;
        let _serialized = lock
            .lock()
            .map_err(|_| StoreError::unavailable("item lock poisoned"))?;

        let item = self
            .store
            .get_item(item_id)?
            .ok_or(DomainError::ItemNotFound(item_id))?;

        let change = StockChange {
            delta,
            reason,
            price_at_change,
        };
        let outcome = item.prepare_change(&change)?;
        let updated = item.with_outcome(&outcome);

        let pending = PendingStockEvent {
            id: StockEventId::new(),
            item_id,
            // Point-in-time snapshot; later supplier reassignment on the
            // item never rewrites it.
            supplier_id: item.supplier_id,
            quantity_delta: delta,
            resulting_quantity: outcome.resulting_quantity,
            reason,
            price_at_change: outcome.price_snapshot,
            recorded_by: recorded_by.to_string(),
            occurred_at: Utc::now(),
        };

        let committed = self.store.commit(updated, pending)?;
        Ok(committed)
    }

    /// Create an item together with its synthetic opening-stock event.
    ///
    /// An opening quantity of zero records no event: a zero delta is only
    /// legal for price changes, and an empty stream already sums to zero.
    #[instrument(skip(self, new_item), err)]
    pub fn create_item(&self, new_item: NewItem) -> Result<Item, LedgerError> {
        let item = new_item.into_item(ItemId::new(), Utc::now())?;

        if let Some(existing) = self.store.find_item_by_name(&item.name)? {
            return Err(DomainError::conflict(format!(
                "item name already in use by {}",
                existing.id
            ))
            .into());
        }

        let opening = item.quantity;
        let mut row = item;
        row.quantity = 0;
        self.store.insert_item(row.clone())?;

        if opening > 0 {
            let pending = PendingStockEvent {
                id: StockEventId::new(),
                item_id: row.id,
                supplier_id: row.supplier_id,
                quantity_delta: opening,
                resulting_quantity: opening,
                reason: StockChangeReason::InitialStock,
                price_at_change: Some(row.unit_price),
                recorded_by: row.created_by.clone(),
                occurred_at: Utc::now(),
            };
            row.quantity = opening;
            self.store.commit(row.clone(), pending)?;
        }

        Ok(row)
    }

    /// Update projection metadata (name, supplier, reorder threshold).
    ///
    /// Quantity and price deliberately have no path through here; they
    /// move only via [`Self::record_change`] so history stays complete.
    /// Reassigning the supplier does not rewrite historical events; their
    /// snapshots are historical fact.
    #[instrument(skip(self, update), fields(%item_id), err)]
    pub fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> Result<Item, LedgerError> {
        let lock = self.item_lock(item_id)?;
        let _serialized = lock
            .lock()
            .map_err(|_| StoreError::unavailable("item lock poisoned"))?;

        let mut item = self
            .store
            .get_item(item_id)?
            .ok_or(DomainError::ItemNotFound(item_id))?;
        if item.disabled {
            return Err(DomainError::ItemNotFound(item_id).into());
        }

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("item name cannot be empty").into());
            }
            if let Some(existing) = self.store.find_item_by_name(&name)? {
                if existing.id != item_id {
                    return Err(DomainError::conflict(format!(
                        "item name already in use by {}",
                        existing.id
                    ))
                    .into());
                }
            }
            item.name = name;
        }

        if let Some(supplier_id) = update.supplier_id {
            item.supplier_id = supplier_id;
        }

        if let Some(minimum) = update.minimum_quantity {
            if minimum <= 0 {
                return Err(
                    DomainError::validation("minimum quantity must be positive").into(),
                );
            }
            item.minimum_quantity = minimum;
        }

        self.store.update_item(item.clone())?;
        Ok(item)
    }

    /// Disable an item, writing off any remaining stock.
    ///
    /// Items are never hard-deleted (that would orphan history). The
    /// reason must explain where the stock went: one of the write-off
    /// family or a return to the supplier. If stock remains, a
    /// compensating negative event commits together with the disabled
    /// row; returns the event, or `None` when the item was already empty.
    #[instrument(skip(self, recorded_by), fields(%item_id, %reason), err)]
    pub fn disable_item(
        &self,
        item_id: ItemId,
        reason: StockChangeReason,
        recorded_by: &str,
    ) -> Result<Option<StockEvent>, LedgerError> {
        require_actor(recorded_by)?;
        if !reason.allows_disable() {
            return Err(DomainError::invalid_reason(format!(
                "{reason} does not explain where disabled stock went"
            ))
            .into());
        }

        let lock = self.item_lock(item_id)?;
        let _serialized = lock
            .lock()
            .map_err(|_| StoreError::unavailable("item lock poisoned"))?;

        let item = self
            .store
            .get_item(item_id)?
            .ok_or(DomainError::ItemNotFound(item_id))?;
        if item.disabled {
            return Err(DomainError::ItemNotFound(item_id).into());
        }

        if item.quantity == 0 {
            let mut row = item;
            row.disabled = true;
            self.store.update_item(row)?;
            return Ok(None);
        }

        let change = StockChange {
            delta: -item.quantity,
            reason,
            price_at_change: None,
        };
        let outcome = item.prepare_change(&change)?;
        let mut updated = item.with_outcome(&outcome);
        updated.disabled = true;

        let pending = PendingStockEvent {
            id: StockEventId::new(),
            item_id,
            supplier_id: item.supplier_id,
            quantity_delta: change.delta,
            resulting_quantity: outcome.resulting_quantity,
            reason,
            price_at_change: outcome.price_snapshot,
            recorded_by: recorded_by.to_string(),
            occurred_at: Utc::now(),
        };

        let committed = self.store.commit(updated, pending)?;
        Ok(Some(committed))
    }

    /// Projection lookup (read-only convenience for lifecycle callers).
    pub fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, LedgerError> {
        Ok(self.store.get_item(item_id)?)
    }

    /// All projection rows (read-only convenience).
    pub fn list_items(&self) -> Result<Vec<Item>, LedgerError> {
        Ok(self.store.list_items()?)
    }
}

fn require_actor(recorded_by: &str) -> Result<(), DomainError> {
    if recorded_by.trim().is_empty() {
        return Err(DomainError::validation("recorded_by is required"));
    }
    Ok(())
}
