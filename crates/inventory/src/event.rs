//! The append-only stock event record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{ItemId, StockEventId, SupplierId};

use crate::reason::StockChangeReason;

/// One immutable entry in the stock ledger.
///
/// Events are facts: once committed they are never updated or deleted;
/// corrections are modeled as new compensating events. The store assigns
/// `sequence` at commit time, which breaks timestamp ties so events of an
/// item form a total order under `(occurred_at, sequence)`.
///
/// `supplier_id` is a **point-in-time snapshot** of the item's supplier,
/// captured at write time. It is historical fact, not a live relation: a
/// later supplier reassignment on the item never touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEvent {
    pub id: StockEventId,
    /// Store-assigned global insertion order (strictly increasing).
    pub sequence: u64,
    pub item_id: ItemId,
    pub supplier_id: SupplierId,
    /// Signed change; positive inbound, negative outbound, zero only for
    /// price-only events.
    pub quantity_delta: i64,
    /// Post-event stock snapshot, never negative.
    pub resulting_quantity: i64,
    pub reason: StockChangeReason,
    /// Unit price snapshot at the time of the change, when known.
    pub price_at_change: Option<Decimal>,
    /// Opaque principal identifier supplied by the (already authorized) caller.
    pub recorded_by: String,
    /// Server-authoritative commit time.
    pub occurred_at: DateTime<Utc>,
}

impl StockEvent {
    /// Ordering key for an item's stream: timestamp, ties broken by
    /// insertion sequence. Load-bearing for windowed trend queries.
    pub fn chronological_key(&self) -> (DateTime<Utc>, u64) {
        (self.occurred_at, self.sequence)
    }
}

/// A stock event that has been decided but not yet committed.
///
/// The store assigns the missing `sequence` during its atomic commit and
/// returns the completed [`StockEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStockEvent {
    pub id: StockEventId,
    pub item_id: ItemId,
    pub supplier_id: SupplierId,
    pub quantity_delta: i64,
    pub resulting_quantity: i64,
    pub reason: StockChangeReason,
    pub price_at_change: Option<Decimal>,
    pub recorded_by: String,
    pub occurred_at: DateTime<Utc>,
}

impl PendingStockEvent {
    pub fn into_committed(self, sequence: u64) -> StockEvent {
        StockEvent {
            id: self.id,
            sequence,
            item_id: self.item_id,
            supplier_id: self.supplier_id,
            quantity_delta: self.quantity_delta,
            resulting_quantity: self.resulting_quantity,
            reason: self.reason,
            price_at_change: self.price_at_change,
            recorded_by: self.recorded_by,
            occurred_at: self.occurred_at,
        }
    }
}

/// Sort a batch of events into chronological order.
///
/// Stores hand streams out already ordered; consumers that merge streams
/// (or replay defensively) re-sort with this before reducing.
pub fn sort_chronologically(events: &mut [StockEvent]) {
    events.sort_by_key(StockEvent::chronological_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(sequence: u64, ts: &str) -> StockEvent {
        StockEvent {
            id: StockEventId::new(),
            sequence,
            item_id: ItemId::new(),
            supplier_id: SupplierId::new(),
            quantity_delta: 1,
            resulting_quantity: 1,
            reason: StockChangeReason::Received,
            price_at_change: Some(dec!(9.99)),
            recorded_by: "tester@example.com".to_string(),
            occurred_at: ts.parse().unwrap(),
        }
    }

    #[test]
    fn sequence_breaks_timestamp_ties() {
        let mut events = vec![
            event(3, "2025-05-01T10:00:00Z"),
            event(1, "2025-05-01T10:00:00Z"),
            event(2, "2025-05-01T09:00:00Z"),
        ];
        sort_chronologically(&mut events);
        let order: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
