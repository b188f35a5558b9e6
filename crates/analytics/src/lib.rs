//! Trend and analytics reader.
//!
//! Strictly read-only queries over the ledger store: time-bucketed
//! movement, valuation over time, price trends, low-stock detection, and
//! supplier rollups. No method here writes anything; the reader is a pure
//! function of the stored data: querying twice over unchanged data yields
//! identical results.

pub mod reader;
pub mod types;

pub use reader::{AnalyticsError, AnalyticsReader};
pub use types::{
    DailyStockValue, DashboardSummary, EventSearch, ItemActivity, LowStockItem, MonthlyMovement,
    PriceMovement, PricePoint, SupplierStock,
};
