#![allow(dead_code)]

use cashbook_core::{
    config::{Config, IdPolicy},
    core::services::LedgerService,
    domain::{NewTransaction, Transaction, TransactionKind},
    ledger::BalanceAggregate,
    storage::DatabaseLayout,
    Cashbook,
};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

pub const HEADER: &str = "id,type,amount,date_time,category,note\n";

/// Initializes a fresh database in its own temporary directory.
pub fn setup_ledger(policy: IdPolicy) -> (LedgerService, DatabaseLayout, TempDir) {
    let temp = TempDir::new().expect("create temp dir");
    let layout = DatabaseLayout::under(temp.path());
    layout
        .initialize(&Config::default().default_categories)
        .expect("initialize database");
    let service =
        LedgerService::with_policy(layout.ledger_store(), policy, 9).expect("open ledger");
    (service, layout, temp)
}

pub fn setup_cashbook() -> (Cashbook, TempDir) {
    let temp = TempDir::new().expect("create temp dir");
    let mut config = Config::default();
    config.default_categories.push("salary".into());
    let book = Cashbook::open(temp.path(), &config).expect("open cashbook");
    (book, temp)
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn draft(kind: TransactionKind, amount: u64, category: &str) -> NewTransaction {
    NewTransaction::new(kind, amount, at(1, 9), category)
}

/// Aggregate rebuilt from scratch by reading the ledger again.
pub fn refold(service: &LedgerService) -> BalanceAggregate {
    BalanceAggregate::fold(service.transactions().expect("scan")).expect("fold")
}

pub fn rows(service: &LedgerService) -> Vec<Transaction> {
    service
        .transactions()
        .expect("scan")
        .map(|row| row.expect("decode row"))
        .collect()
}
