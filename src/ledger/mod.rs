//! Derived ledger state.

pub mod aggregate;

pub use aggregate::{BalanceAggregate, Delta};
