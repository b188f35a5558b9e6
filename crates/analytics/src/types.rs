//! Plain aggregate shapes returned by the trend reader.
//!
//! These are the outbound read models: flat structures, serde-ready, with
//! no behavior of their own. The core imposes no serialization format;
//! consumers pick their own.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{ItemId, SupplierId};

/// Stock moved in and out of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMovement {
    /// `YYYY-MM`.
    pub month: String,
    /// Sum of positive deltas.
    pub inbound: i64,
    /// Sum of absolute negative deltas (reported positive).
    pub outbound: i64,
}

/// Whole-inventory valuation on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStockValue {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Direction of a price observation relative to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMovement {
    Up,
    Down,
    Flat,
}

/// One price observation paired with its predecessor from the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub occurred_at: DateTime<Utc>,
    pub price: Decimal,
    /// The immediately preceding observed price; `None` for the first
    /// observation the stream has ever seen.
    pub previous: Option<Decimal>,
    pub movement: PriceMovement,
    /// Absolute difference to `previous` (zero when there is none).
    pub magnitude: Decimal,
}

/// An item below its reorder threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub minimum_quantity: i64,
    pub supplier_id: SupplierId,
}

/// Current stock position of one supplier, from item projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierStock {
    pub supplier_id: SupplierId,
    pub total_quantity: i64,
    pub total_value: Decimal,
}

/// How often an item's stock has been touched (event count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemActivity {
    pub item_id: ItemId,
    pub name: String,
    pub update_count: u64,
}

/// Multi-criteria event search. Every field is optional; missing date
/// bounds default to the last 30 days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSearch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring on the item name.
    pub item_name: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub recorded_by: Option<String>,
    pub min_delta: Option<i64>,
    pub max_delta: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Consolidated KPI bundle for dashboard consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub stock_per_supplier: Vec<SupplierStock>,
    pub low_stock_items: Vec<LowStockItem>,
    pub monthly_movement: Vec<MonthlyMovement>,
    pub top_updated_items: Vec<ItemActivity>,
}
