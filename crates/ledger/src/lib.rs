//! The ledger service: the single write path of the stock ledger.
//!
//! Every mutation of an item (opening stock, quantity changes, price
//! changes, disabling) flows through [`LedgerService`], which validates
//! the request with pure domain logic and commits the resulting event and
//! projection update as one atomic unit against a [`LedgerStore`].

mod integration_tests;
pub mod service;

pub use service::{LedgerError, LedgerService};

pub use stockledger_infra::LedgerStore;
