pub mod cashbook;
pub mod services;
pub mod utils;
pub mod validation;

pub use cashbook::{Cashbook, Filter, Rows};
pub use validation::TransactionValidator;
