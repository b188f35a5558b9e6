//! Period financial summary (weighted-average cost).

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stockledger_core::{DateWindow, ItemId};
use stockledger_inventory::{sort_chronologically, StockEvent};

use crate::wac::WacState;

/// Financial picture of a period, derived entirely by replay.
///
/// The balancing identity:
///
/// ```text
/// opening + purchases + returns_in - cogs - write_offs = ending
/// ```
///
/// Returns to the supplier are folded into `purchases` as negative
/// purchases rather than given a bucket of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub window: DateWindow,

    /// State at the instant before the window opens.
    pub opening_qty: i64,
    pub opening_value: Decimal,

    /// Inbound acquisitions within the window (supplier returns subtract).
    pub purchases_qty: i64,
    pub purchases_cost: Decimal,

    /// Customer returns coming back into stock.
    pub returns_in_qty: i64,
    pub returns_in_cost: Decimal,

    /// Cost of goods sold: sold (and uncategorized) outbound at average.
    pub cogs_qty: i64,
    pub cogs_cost: Decimal,

    /// Damaged / scrapped / destroyed / expired / lost.
    pub write_off_qty: i64,
    pub write_off_cost: Decimal,

    /// State at the window's close.
    pub ending_qty: i64,
    pub ending_value: Decimal,

    /// COGS ÷ average(opening value, ending value); `None` when the
    /// denominator is zero.
    pub turnover: Option<Decimal>,
}

impl FinancialSummary {
    /// Presentation copy with every monetary figure rounded to cents.
    /// Internal figures keep their guard digits; rounding happens here and
    /// nowhere earlier.
    pub fn rounded(&self) -> FinancialSummary {
        let cents =
            |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        FinancialSummary {
            opening_value: cents(self.opening_value),
            purchases_cost: cents(self.purchases_cost),
            returns_in_cost: cents(self.returns_in_cost),
            cogs_cost: cents(self.cogs_cost),
            write_off_cost: cents(self.write_off_cost),
            ending_value: cents(self.ending_value),
            turnover: self.turnover.map(|t| {
                t.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            }),
            ..self.clone()
        }
    }
}

/// Compute the period summary for a window over one or many item streams.
///
/// Two phases, one ordered pass each:
///
/// 1. Events strictly before the window establish the opening baseline
///    (per-item quantity and blended cost, no buckets).
/// 2. Events inside the window are routed into buckets while the same
///    per-item state keeps evolving.
///
/// Events after the window's end are ignored. Pure: same events, same
/// window, same summary.
pub fn financial_summary(events: &[StockEvent], window: DateWindow) -> FinancialSummary {
    let mut ordered: Vec<StockEvent> = events.to_vec();
    sort_chronologically(&mut ordered);

    let start = window.start_instant();
    let end = window.end_instant();

    let mut state: HashMap<ItemId, WacState> = HashMap::new();

    // Phase 1: opening baseline.
    for event in ordered.iter().filter(|e| e.occurred_at < start) {
        let entry = state.entry(event.item_id).or_default();
        if event.quantity_delta > 0 {
            let unit = event.price_at_change.unwrap_or(entry.avg_cost);
            *entry = entry.apply_inbound(event.quantity_delta, unit);
        } else if event.quantity_delta < 0 {
            let (next, _) = entry.issue(-event.quantity_delta);
            *entry = next;
        }
    }

    let mut opening_qty = 0i64;
    let mut opening_value = Decimal::ZERO;
    for st in state.values() {
        opening_qty += st.qty;
        opening_value += st.held_value();
    }

    // Phase 2: in-window bucket routing.
    let mut purchases_qty = 0i64;
    let mut purchases_cost = Decimal::ZERO;
    let mut returns_in_qty = 0i64;
    let mut returns_in_cost = Decimal::ZERO;
    let mut cogs_qty = 0i64;
    let mut cogs_cost = Decimal::ZERO;
    let mut write_off_qty = 0i64;
    let mut write_off_cost = Decimal::ZERO;

    for event in ordered
        .iter()
        .filter(|e| e.occurred_at >= start && e.occurred_at <= end)
    {
        let entry = state.entry(event.item_id).or_default();

        if event.quantity_delta > 0 {
            let unit = event.price_at_change.unwrap_or(entry.avg_cost);
            *entry = entry.apply_inbound(event.quantity_delta, unit);

            if event.reason.is_customer_return() {
                returns_in_qty += event.quantity_delta;
                returns_in_cost += unit * Decimal::from(event.quantity_delta);
            } else {
                purchases_qty += event.quantity_delta;
                purchases_cost += unit * Decimal::from(event.quantity_delta);
            }
        } else if event.quantity_delta < 0 {
            let out = -event.quantity_delta;
            let (next, cost) = entry.issue(out);
            *entry = next;

            if event.reason.is_supplier_return() {
                // Goods going back to the supplier reverse a purchase.
                purchases_qty -= out;
                purchases_cost -= cost;
            } else if event.reason.is_write_off() {
                write_off_qty += out;
                write_off_cost += cost;
            } else {
                cogs_qty += out;
                cogs_cost += cost;
            }
        }
        // Zero-delta (price-only) events carry no quantity and no bucket.
    }

    let mut ending_qty = 0i64;
    let mut ending_value = Decimal::ZERO;
    for st in state.values() {
        ending_qty += st.qty;
        ending_value += st.held_value();
    }

    let two = Decimal::from(2);
    let average_held = (opening_value + ending_value) / two;
    let turnover = if average_held.is_zero() {
        None
    } else {
        Some(cogs_cost / average_held)
    };

    FinancialSummary {
        window,
        opening_qty,
        opening_value,
        purchases_qty,
        purchases_cost,
        returns_in_qty,
        returns_in_cost,
        cogs_qty,
        cogs_cost,
        write_off_qty,
        write_off_cost,
        ending_qty,
        ending_value,
        turnover,
    }
}
