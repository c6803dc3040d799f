//! Flat-file persistence for transactions and categories.

pub mod atomic;
pub mod category_store;
pub mod codec;
pub mod layout;
pub mod ledger_store;

pub use atomic::StagedReplace;
pub use category_store::{CategoryScan, CategoryStore};
pub use layout::{DatabaseLayout, DEFAULT_CATEGORIES};
pub use ledger_store::{LedgerScan, LedgerStore, Replacement, StagedRewrite};
