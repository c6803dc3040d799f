//! Entry point tying validation, categories, and the ledger together.

use std::path::PathBuf;

use crate::{
    config::{Config, ConfigManager},
    core::{
        services::{CategoryBreakdown, CategoryService, LedgerService, SummaryService},
        utils::app_data_dir,
        validation::TransactionValidator,
    },
    domain::{Transaction, TransactionId, TransactionKind, TransactionPatch},
    errors::Result,
    storage::{DatabaseLayout, LedgerScan},
};

/// Read-side selection over the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<'a> {
    Category(&'a str),
    Kind(TransactionKind),
    /// Inclusive on both ends.
    AmountRange { min: u64, max: u64 },
    /// Inclusive, `YYYY-MM-DD HH:MM:SS` bounds.
    DateRange { start: &'a str, end: &'a str },
}

pub type Rows<'a> = Box<dyn Iterator<Item = Result<Transaction>> + 'a>;

pub struct Cashbook {
    layout: DatabaseLayout,
    ledger: LedgerService,
    categories: CategoryService,
}

impl Cashbook {
    /// Opens the database under the app data directory with the stored configuration.
    pub fn open_default() -> Result<Self> {
        let config = ConfigManager::new()?.load()?;
        Self::open(app_data_dir(), &config)
    }

    /// Initializes (and if needed heals) the database under `root`, then loads it.
    pub fn open(root: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let layout = DatabaseLayout::under(root);
        layout.initialize(&config.default_categories)?;
        let ledger =
            LedgerService::with_policy(layout.ledger_store(), config.id_policy, config.id_width)?;
        let categories = CategoryService::open(layout.category_store())?;
        Ok(Self {
            layout,
            ledger,
            categories,
        })
    }

    pub fn layout(&self) -> &DatabaseLayout {
        &self.layout
    }

    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    /// Validates raw fields and records a new transaction.
    pub fn add_transaction(&mut self, fields: &[(&str, &str)]) -> Result<TransactionId> {
        let draft = TransactionValidator::new(self.categories.set()).draft(fields.iter().copied())?;
        self.ledger.create_transaction(draft)
    }

    /// Validates raw fields and applies them to `id`. Unknown ids are a silent `false`.
    pub fn update_transaction(&mut self, id: &str, fields: &[(&str, &str)]) -> Result<bool> {
        let patch = TransactionPatch::from_fields(fields.iter().copied())?;
        TransactionValidator::new(self.categories.set()).validate_fields(fields.iter().copied())?;
        self.ledger
            .update_transaction(&TransactionId::from(id), &patch)
    }

    pub fn delete_transaction(&mut self, id: &str) -> Result<bool> {
        self.ledger.delete_transaction(&TransactionId::from(id))
    }

    pub fn transactions(&self) -> Result<LedgerScan> {
        self.ledger.transactions()
    }

    pub fn filter_by<'a>(&self, filter: Filter<'a>) -> Result<Rows<'a>> {
        let rows: Rows<'a> = match filter {
            Filter::Category(category) => Box::new(self.ledger.by_category(category)?),
            Filter::Kind(kind) => Box::new(self.ledger.by_kind(kind)?),
            Filter::AmountRange { min, max } => Box::new(self.ledger.by_amount_range(min, max)?),
            Filter::DateRange { start, end } => Box::new(self.ledger.by_date_range(start, end)?),
        };
        Ok(rows)
    }

    pub fn count(&self) -> u64 {
        self.ledger.aggregate().count()
    }

    pub fn income(&self) -> u64 {
        self.ledger.aggregate().income()
    }

    pub fn expense(&self) -> u64 {
        self.ledger.aggregate().expense()
    }

    pub fn balance(&self) -> i128 {
        self.ledger.aggregate().balance()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.list()
    }

    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        self.categories.add(name)
    }

    /// Transactions already filed under `name` keep the now-unknown category.
    pub fn remove_category(&mut self, name: &str) -> Result<bool> {
        self.categories.remove(name)
    }

    pub fn expense_by_category(&self) -> Result<CategoryBreakdown> {
        SummaryService::expense_by_category(
            self.categories.list(),
            self.ledger.by_kind(TransactionKind::Expense)?,
        )
    }
}
