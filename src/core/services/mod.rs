pub mod category_service;
pub mod ledger_service;
pub mod summary_service;

pub use category_service::CategoryService;
pub use ledger_service::LedgerService;
pub use summary_service::{CategoryBreakdown, SummaryService};
