pub mod transaction;

pub use transaction::{
    Entry, NewTransaction, Transaction, TransactionId, TransactionKind, TransactionPatch,
    TIMESTAMP_FORMAT,
};
