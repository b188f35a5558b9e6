//! Closed enumeration of stock change reasons.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockledger_core::DomainError;

/// Why a stock quantity (or price) changed.
///
/// This is a **closed** set: unrecognized values are rejected at the
/// boundary (`FromStr`/serde), never deep inside aggregation logic, and
/// every consumer matches exhaustively so adding a variant is a compile
/// error until all sites handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockChangeReason {
    /// Opening quantity recorded when an item enters the ledger.
    InitialStock,
    /// Stock received from a supplier (inbound).
    Received,
    /// Stock sold to a customer (outbound).
    Sold,
    /// Manual correction by a user (discrepancy fix, stocktake).
    Adjusted,
    /// Price-only event: quantity delta is zero, the unit price moves.
    PriceChange,
    /// Damaged but not yet scrapped or returned.
    Damaged,
    /// Scrapped due to damage, policy, or internal decision.
    Scrapped,
    /// Destroyed beyond use (fire, critical damage).
    Destroyed,
    /// Passed its expiration date, no longer sellable.
    Expired,
    /// Missing or lost during handling, shipping, or storage.
    Lost,
    /// Returned by a customer (inbound).
    ReturnedByCustomer,
    /// Returned to the supplier, e.g. defective goods (outbound).
    ReturnedToSupplier,
}

impl StockChangeReason {
    /// All variants, in declaration order.
    pub const ALL: [StockChangeReason; 12] = [
        Self::InitialStock,
        Self::Received,
        Self::Sold,
        Self::Adjusted,
        Self::PriceChange,
        Self::Damaged,
        Self::Scrapped,
        Self::Destroyed,
        Self::Expired,
        Self::Lost,
        Self::ReturnedByCustomer,
        Self::ReturnedToSupplier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialStock => "initial_stock",
            Self::Received => "received",
            Self::Sold => "sold",
            Self::Adjusted => "adjusted",
            Self::PriceChange => "price_change",
            Self::Damaged => "damaged",
            Self::Scrapped => "scrapped",
            Self::Destroyed => "destroyed",
            Self::Expired => "expired",
            Self::Lost => "lost",
            Self::ReturnedByCustomer => "returned_by_customer",
            Self::ReturnedToSupplier => "returned_to_supplier",
        }
    }

    /// Stock leaving the books without revenue: valued at average cost and
    /// bucketed as write-offs by the valuation engine.
    pub fn is_write_off(&self) -> bool {
        matches!(
            self,
            Self::Damaged | Self::Scrapped | Self::Destroyed | Self::Expired | Self::Lost
        )
    }

    /// Inbound customer return.
    pub fn is_customer_return(&self) -> bool {
        matches!(self, Self::ReturnedByCustomer)
    }

    /// Outbound return to the supplier (a negative purchase, financially).
    pub fn is_supplier_return(&self) -> bool {
        matches!(self, Self::ReturnedToSupplier)
    }

    /// Only price-only events may carry a zero quantity delta.
    pub fn allows_zero_delta(&self) -> bool {
        matches!(self, Self::PriceChange)
    }

    /// Reasons an item may be disabled with: the stock must be leaving the
    /// books for good (write-off family or a return to the supplier).
    pub fn allows_disable(&self) -> bool {
        self.is_write_off() || self.is_supplier_return()
    }
}

impl core::fmt::Display for StockChangeReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockChangeReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::invalid_reason(format!("unsupported change reason: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for reason in StockChangeReason::ALL {
            let parsed: StockChangeReason = reason.as_str().parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }

    #[test]
    fn rejects_unknown_reason_at_the_boundary() {
        let err = "teleported".parse::<StockChangeReason>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidReason(_)));

        // Same rule through serde.
        assert!(serde_json::from_str::<StockChangeReason>("\"teleported\"").is_err());
    }

    #[test]
    fn serde_uses_snake_case_strings() {
        let json = serde_json::to_string(&StockChangeReason::ReturnedByCustomer).unwrap();
        assert_eq!(json, "\"returned_by_customer\"");
    }

    #[test]
    fn write_off_family() {
        assert!(StockChangeReason::Lost.is_write_off());
        assert!(StockChangeReason::Expired.is_write_off());
        assert!(!StockChangeReason::Sold.is_write_off());
        assert!(!StockChangeReason::ReturnedToSupplier.is_write_off());
    }
}
