//! The item projection and its change-decision logic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, ItemId, SupplierId};

use crate::reason::StockChangeReason;

/// Reorder threshold applied when a caller supplies none (or a non-positive one).
pub const DEFAULT_MINIMUM_QUANTITY: i64 = 10;

/// Current state of one product, derived from (and kept consistent with)
/// its event stream.
///
/// Mutable, but exclusively owned by the ledger service: readers get
/// snapshots, and every mutation goes through a decided change committed
/// together with its event. Items are never hard-deleted (deletion would
/// orphan history), only disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Unique (case-insensitive) display name.
    pub name: String,
    /// On-hand stock; never negative.
    pub quantity: i64,
    /// Current unit price. Updated only by price-change events.
    pub unit_price: Decimal,
    pub supplier_id: SupplierId,
    /// Below this the item shows up in low-stock output.
    pub minimum_quantity: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub disabled: bool,
}

impl Item {
    /// Low stock: strictly below the reorder threshold. Disabled items are
    /// never flagged.
    pub fn is_low_stock(&self) -> bool {
        !self.disabled && self.quantity < self.minimum_quantity
    }

    /// Current-state valuation (quantity × unit price).
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// Validate a requested change against this item and compute its
    /// outcome. Pure: no IO, no mutation; the ledger service commits the
    /// outcome atomically or not at all.
    pub fn prepare_change(&self, change: &StockChange) -> DomainResult<ChangeOutcome> {
        if self.disabled {
            return Err(DomainError::item_not_found(self.id));
        }

        if let Some(price) = change.price_at_change {
            if price < Decimal::ZERO {
                return Err(DomainError::invalid_reason(
                    "price_at_change cannot be negative",
                ));
            }
        }

        if change.reason == StockChangeReason::PriceChange {
            if change.delta != 0 {
                return Err(DomainError::invalid_reason(
                    "price_change events must carry a zero quantity delta",
                ));
            }
            let price = change.price_at_change.ok_or_else(|| {
                DomainError::invalid_reason("price_change requires price_at_change")
            })?;
            return Ok(ChangeOutcome {
                resulting_quantity: self.quantity,
                price_snapshot: Some(price),
                new_unit_price: Some(price),
            });
        }

        if change.delta == 0 {
            return Err(DomainError::invalid_reason(format!(
                "zero delta is only valid for price_change (got {})",
                change.reason
            )));
        }

        let resulting = self.quantity + change.delta;
        if resulting < 0 {
            return Err(DomainError::negative_stock(self.quantity, change.delta));
        }

        Ok(ChangeOutcome {
            resulting_quantity: resulting,
            // Omitted price snapshots are captured from the item's current
            // price, so nearly every event carries a price for analytics.
            price_snapshot: change.price_at_change.or(Some(self.unit_price)),
            new_unit_price: None,
        })
    }

    /// Apply a decided outcome, producing the updated projection row.
    pub fn with_outcome(&self, outcome: &ChangeOutcome) -> Item {
        let mut updated = self.clone();
        updated.quantity = outcome.resulting_quantity;
        if let Some(price) = outcome.new_unit_price {
            updated.unit_price = price;
        }
        updated
    }
}

/// A requested stock change, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub delta: i64,
    pub reason: StockChangeReason,
    pub price_at_change: Option<Decimal>,
}

/// The decided effect of a valid change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub resulting_quantity: i64,
    /// Price recorded on the event (explicit, or captured from the item).
    pub price_snapshot: Option<Decimal>,
    /// New projection unit price; `Some` only for price-change events.
    pub new_unit_price: Option<Decimal>,
}

/// Input for item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub supplier_id: SupplierId,
    pub minimum_quantity: Option<i64>,
    pub created_by: String,
}

impl NewItem {
    /// Validate creation input and build the projection row.
    pub fn into_item(self, id: ItemId, created_at: DateTime<Utc>) -> DomainResult<Item> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("opening quantity cannot be negative"));
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(DomainError::validation("unit price must be positive"));
        }
        if self.created_by.trim().is_empty() {
            return Err(DomainError::validation("created_by is required"));
        }

        let minimum_quantity = match self.minimum_quantity {
            Some(m) if m > 0 => m,
            _ => DEFAULT_MINIMUM_QUANTITY,
        };

        Ok(Item {
            id,
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            supplier_id: self.supplier_id,
            minimum_quantity,
            created_by: self.created_by,
            created_at,
            disabled: false,
        })
    }
}

/// Partial update of projection metadata.
///
/// Quantity and price are deliberately absent: those move only through
/// recorded changes so the event history stays complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub minimum_quantity: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_item(quantity: i64) -> Item {
        Item {
            id: ItemId::new(),
            name: "Widget".to_string(),
            quantity,
            unit_price: dec!(10.00),
            supplier_id: SupplierId::new(),
            minimum_quantity: DEFAULT_MINIMUM_QUANTITY,
            created_by: "tester@example.com".to_string(),
            created_at: Utc::now(),
            disabled: false,
        }
    }

    #[test]
    fn outbound_change_reduces_quantity() {
        let item = test_item(50);
        let outcome = item
            .prepare_change(&StockChange {
                delta: -30,
                reason: StockChangeReason::Sold,
                price_at_change: None,
            })
            .unwrap();
        assert_eq!(outcome.resulting_quantity, 20);
        // Price captured from the item when the caller omits it.
        assert_eq!(outcome.price_snapshot, Some(dec!(10.00)));
        assert_eq!(outcome.new_unit_price, None);
    }

    #[test]
    fn rejects_change_below_zero() {
        let item = test_item(50);
        let err = item
            .prepare_change(&StockChange {
                delta: -200,
                reason: StockChangeReason::Sold,
                price_at_change: None,
            })
            .unwrap_err();
        assert_eq!(err, DomainError::NegativeStock { current: 50, delta: -200 });
    }

    #[test]
    fn rejects_zero_delta_outside_price_change() {
        let item = test_item(5);
        let err = item
            .prepare_change(&StockChange {
                delta: 0,
                reason: StockChangeReason::Adjusted,
                price_at_change: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidReason(_)));
    }

    #[test]
    fn price_change_updates_price_but_not_quantity() {
        let item = test_item(40);
        let outcome = item
            .prepare_change(&StockChange {
                delta: 0,
                reason: StockChangeReason::PriceChange,
                price_at_change: Some(dec!(15.00)),
            })
            .unwrap();
        assert_eq!(outcome.resulting_quantity, 40);
        assert_eq!(outcome.new_unit_price, Some(dec!(15.00)));

        let updated = item.with_outcome(&outcome);
        assert_eq!(updated.quantity, 40);
        assert_eq!(updated.unit_price, dec!(15.00));
    }

    #[test]
    fn price_change_requires_a_price() {
        let item = test_item(40);
        let err = item
            .prepare_change(&StockChange {
                delta: 0,
                reason: StockChangeReason::PriceChange,
                price_at_change: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidReason(_)));
    }

    #[test]
    fn rejects_negative_price_snapshot() {
        let item = test_item(40);
        let err = item
            .prepare_change(&StockChange {
                delta: 5,
                reason: StockChangeReason::Received,
                price_at_change: Some(dec!(-1.00)),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidReason(_)));
    }

    #[test]
    fn disabled_item_reads_as_not_found() {
        let mut item = test_item(10);
        item.disabled = true;
        let err = item
            .prepare_change(&StockChange {
                delta: 1,
                reason: StockChangeReason::Received,
                price_at_change: None,
            })
            .unwrap_err();
        assert_eq!(err, DomainError::ItemNotFound(item.id));
    }

    #[test]
    fn new_item_applies_minimum_quantity_default() {
        let new = NewItem {
            name: "Bolt".to_string(),
            quantity: 3,
            unit_price: dec!(0.50),
            supplier_id: SupplierId::new(),
            minimum_quantity: Some(0),
            created_by: "tester@example.com".to_string(),
        };
        let item = new.into_item(ItemId::new(), Utc::now()).unwrap();
        assert_eq!(item.minimum_quantity, DEFAULT_MINIMUM_QUANTITY);
    }

    #[test]
    fn new_item_rejects_bad_input() {
        let base = NewItem {
            name: "Bolt".to_string(),
            quantity: 3,
            unit_price: dec!(0.50),
            supplier_id: SupplierId::new(),
            minimum_quantity: None,
            created_by: "tester@example.com".to_string(),
        };

        let blank = NewItem { name: "  ".to_string(), ..base.clone() };
        assert!(blank.into_item(ItemId::new(), Utc::now()).is_err());

        let free = NewItem { unit_price: dec!(0), ..base.clone() };
        assert!(free.into_item(ItemId::new(), Utc::now()).is_err());

        let negative = NewItem { quantity: -1, ..base };
        assert!(negative.into_item(ItemId::new(), Utc::now()).is_err());
    }

    #[test]
    fn low_stock_respects_threshold_and_disabled_flag() {
        let mut item = test_item(8);
        assert!(item.is_low_stock());

        item.minimum_quantity = 5;
        assert!(!item.is_low_stock());

        item.minimum_quantity = 10;
        item.disabled = true;
        assert!(!item.is_low_stock());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: any sequence of accepted deltas keeps the running
            /// quantity equal to the sum of applied deltas and never lets a
            /// resulting quantity dip below zero.
            #[test]
            fn accepted_changes_preserve_the_running_sum(
                deltas in prop::collection::vec(-50i64..50, 0..64)
            ) {
                let mut item = test_item(0);
                let mut applied_sum = 0i64;

                for delta in deltas {
                    if delta == 0 {
                        continue;
                    }
                    let change = StockChange {
                        delta,
                        reason: if delta > 0 {
                            StockChangeReason::Received
                        } else {
                            StockChangeReason::Sold
                        },
                        price_at_change: None,
                    };
                    match item.prepare_change(&change) {
                        Ok(outcome) => {
                            prop_assert!(outcome.resulting_quantity >= 0);
                            applied_sum += delta;
                            item = item.with_outcome(&outcome);
                        }
                        Err(err) => {
                            // Only the negative-stock rule may reject here,
                            // and a rejection must leave no trace.
                            let is_negative_stock =
                                matches!(err, DomainError::NegativeStock { .. });
                            prop_assert!(is_negative_stock);
                        }
                    }
                    prop_assert_eq!(item.quantity, applied_sum);
                }
            }
        }
    }
}
