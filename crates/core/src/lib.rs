//! `stockledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod window;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, StockEventId, SupplierId};
pub use window::DateWindow;
