//! Running income/expense totals kept in step with the ledger file.

use crate::{
    domain::{Entry, Transaction, TransactionKind},
    errors::{LedgerError, Result},
};

/// Change to the totals caused by one mutation.
///
/// `before` is the row as it was, `after` the row as it is now; a creation has no
/// `before` and a deletion has no `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub before: Option<Entry>,
    pub after: Option<Entry>,
}

impl Delta {
    pub fn created(after: Entry) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(before: Entry, after: Entry) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(before: Entry) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }
}

/// Transaction count and per-kind totals. The balance is always derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceAggregate {
    count: u64,
    income: u64,
    expense: u64,
}

impl BalanceAggregate {
    /// Folds a full pass over the ledger. The first failing row aborts the fold.
    pub fn fold<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Transaction>>,
    {
        let mut aggregate = Self::default();
        for row in rows {
            let txn = row?;
            aggregate.apply_delta(Delta::created(txn.entry()))?;
        }
        Ok(aggregate)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn income(&self) -> u64 {
        self.income
    }

    pub fn expense(&self) -> u64 {
        self.expense
    }

    pub fn balance(&self) -> i128 {
        i128::from(self.income) - i128::from(self.expense)
    }

    /// Subtracts `before` from its bucket and adds `after` to its bucket.
    ///
    /// All arithmetic is checked first; on failure the totals are left unchanged.
    pub(crate) fn apply_delta(&mut self, delta: Delta) -> Result<()> {
        let mut next = *self;
        if let Some(before) = delta.before {
            let bucket = next.bucket_mut(before.kind);
            *bucket = bucket.checked_sub(before.amount).ok_or_else(|| {
                LedgerError::AggregateDrift(format!(
                    "removing {} {} exceeds the running total",
                    before.kind, before.amount
                ))
            })?;
        }
        if let Some(after) = delta.after {
            let bucket = next.bucket_mut(after.kind);
            *bucket = bucket.checked_add(after.amount).ok_or_else(|| {
                LedgerError::AggregateDrift(format!("{} total overflowed", after.kind))
            })?;
        }
        match (delta.before.is_some(), delta.after.is_some()) {
            (false, true) => next.count += 1,
            (true, false) => {
                next.count = next.count.checked_sub(1).ok_or_else(|| {
                    LedgerError::AggregateDrift("deleting from an empty ledger".into())
                })?
            }
            _ => {}
        }
        *self = next;
        Ok(())
    }

    fn bucket_mut(&mut self, kind: TransactionKind) -> &mut u64 {
        match kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
        }
    }
}
