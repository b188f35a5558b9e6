//! Weighted-average-cost valuation engine.
//!
//! A pure, replayable reducer over ordered stock event streams: no mutable
//! state of its own, so every figure it produces is auditable by replaying
//! the same events again. Consumers hand it slices; it never touches a
//! store.

pub mod summary;
pub mod wac;

pub use summary::{financial_summary, FinancialSummary};
pub use wac::{replay, CostBasis, WacState, AVG_COST_SCALE};
