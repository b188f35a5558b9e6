//! Event query types for inspection and analytics.
//!
//! Read-only filter/pagination shapes shared by the trend reader and any
//! external consumer that wants to inspect the ledger directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ItemId, SupplierId};
use stockledger_inventory::{StockChangeReason, StockEvent};

/// Pagination parameters for event queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of events to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Filter criteria for event queries. All fields optional; a default
/// filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub item_id: Option<ItemId>,
    /// Matches the denormalized supplier snapshot on the event, not the
    /// item's current supplier.
    pub supplier_id: Option<SupplierId>,
    pub reason: Option<StockChangeReason>,
    pub recorded_by: Option<String>,
    /// Inclusive lower bound on `occurred_at`.
    pub occurred_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at`.
    pub occurred_before: Option<DateTime<Utc>>,
    pub min_delta: Option<i64>,
    pub max_delta: Option<i64>,
}

impl EventFilter {
    /// Convenience: all events of one item.
    pub fn for_item(item_id: ItemId) -> Self {
        Self {
            item_id: Some(item_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, event: &StockEvent) -> bool {
        if let Some(id) = self.item_id {
            if event.item_id != id {
                return false;
            }
        }
        if let Some(id) = self.supplier_id {
            if event.supplier_id != id {
                return false;
            }
        }
        if let Some(reason) = self.reason {
            if event.reason != reason {
                return false;
            }
        }
        if let Some(by) = &self.recorded_by {
            if &event.recorded_by != by {
                return false;
            }
        }
        if let Some(after) = self.occurred_after {
            if event.occurred_at < after {
                return false;
            }
        }
        if let Some(before) = self.occurred_before {
            if event.occurred_at > before {
                return false;
            }
        }
        if let Some(min) = self.min_delta {
            if event.quantity_delta < min {
                return false;
            }
        }
        if let Some(max) = self.max_delta {
            if event.quantity_delta > max {
                return false;
            }
        }
        true
    }
}

/// Paginated event query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventQueryResult {
    /// Events matching the query, newest first.
    pub events: Vec<StockEvent>,
    /// Total number of matches across all pages.
    pub total: u64,
    /// Pagination parameters used.
    pub pagination: Pagination,
    /// Whether more events are available past this page.
    pub has_more: bool,
}
