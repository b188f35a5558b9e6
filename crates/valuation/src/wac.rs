//! The weighted-average-cost recurrence.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stockledger_inventory::{sort_chronologically, StockEvent};

/// Decimal places carried on the blended average: the 2-dp unit price plus
/// two guard digits, so long histories don't accumulate rounding drift.
/// Rounding to presentation scale happens only at the edges.
pub const AVG_COST_SCALE: u32 = 4;

/// Running cost state of one item: on-hand quantity and blended unit cost.
///
/// - Inbound stock re-blends the average:
///   `avg' = (qty·avg + in·unit) / (qty + in)`
/// - Outbound stock is issued **at** the average; the average itself never
///   moves on the way out: consumption cannot change the cost of what
///   remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WacState {
    pub qty: i64,
    pub avg_cost: Decimal,
}

impl WacState {
    /// Blend inbound stock at `unit_cost` into the average.
    pub fn apply_inbound(self, qty_in: i64, unit_cost: Decimal) -> WacState {
        let new_qty = self.qty + qty_in;
        if new_qty == 0 {
            return WacState {
                qty: 0,
                avg_cost: Decimal::ZERO,
            };
        }
        let held_value = self.avg_cost * Decimal::from(self.qty);
        let inbound_value = unit_cost * Decimal::from(qty_in);
        let avg_cost = ((held_value + inbound_value) / Decimal::from(new_qty))
            .round_dp_with_strategy(AVG_COST_SCALE, RoundingStrategy::MidpointAwayFromZero);
        WacState {
            qty: new_qty,
            avg_cost,
        }
    }

    /// Issue (consume) stock at the current average. Returns the new state
    /// and the cost of what left. Quantity is clamped at zero so a partial
    /// replay (stream starting mid-history) cannot go negative.
    pub fn issue(self, qty_out: i64) -> (WacState, Decimal) {
        let cost = self.avg_cost * Decimal::from(qty_out);
        let state = WacState {
            qty: (self.qty - qty_out).max(0),
            avg_cost: self.avg_cost,
        };
        (state, cost)
    }

    pub fn held_value(&self) -> Decimal {
        self.avg_cost * Decimal::from(self.qty)
    }
}

/// Cost basis of one item derived by full replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBasis {
    /// On-hand quantity after replay.
    pub on_hand: i64,
    /// Blended unit cost (carried at [`AVG_COST_SCALE`]).
    pub avg_cost: Decimal,
    /// The separate market-price pointer: the latest price observed on any
    /// event. Price changes move this, never the average; market price
    /// and cost basis are distinct concepts.
    pub current_price: Option<Decimal>,
    /// Cost of goods sold accumulated across the whole history (sold and
    /// uncategorized outbound, valued at the average in effect).
    pub cogs_to_date: Decimal,
}

/// Replay one item's event stream from the beginning.
///
/// Pure: replaying unchanged events yields an identical result. Events are
/// re-sorted defensively into `(occurred_at, sequence)` order before the
/// single forward pass.
pub fn replay(events: &[StockEvent]) -> CostBasis {
    let mut ordered: Vec<StockEvent> = events.to_vec();
    sort_chronologically(&mut ordered);

    let mut state = WacState::default();
    let mut current_price = None;
    let mut cogs = Decimal::ZERO;

    for event in &ordered {
        if let Some(price) = event.price_at_change {
            current_price = Some(price);
        }

        if event.quantity_delta > 0 {
            // Inbound without a captured price blends at the current
            // average (a no-op on the average).
            let unit = event.price_at_change.unwrap_or(state.avg_cost);
            state = state.apply_inbound(event.quantity_delta, unit);
        } else if event.quantity_delta < 0 {
            let out = event.quantity_delta.unsigned_abs() as i64;
            let (next, cost) = state.issue(out);
            state = next;
            if !event.reason.is_write_off() && !event.reason.is_supplier_return() {
                cogs += cost;
            }
        }
        // Zero-delta events are price-only; the pointer update above is
        // their entire effect.
    }

    CostBasis {
        on_hand: state.qty,
        avg_cost: state.avg_cost,
        current_price,
        cogs_to_date: cogs,
    }
}
