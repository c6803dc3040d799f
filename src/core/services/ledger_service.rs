//! Keeps the ledger file and the balance aggregate moving together.

use crate::{
    config::IdPolicy,
    domain::{NewTransaction, Transaction, TransactionId, TransactionKind, TransactionPatch},
    errors::{LedgerError, Result},
    ledger::{BalanceAggregate, Delta},
    storage::{LedgerScan, LedgerStore},
};

const DEFAULT_ID_WIDTH: usize = 9;

/// Sole mutator of both the ledger store and its aggregate.
pub struct LedgerService {
    store: LedgerStore,
    aggregate: BalanceAggregate,
    id_policy: IdPolicy,
    id_width: usize,
    next_sequence: u64,
}

impl LedgerService {
    /// Opens the service with the default id width and policy.
    pub fn open(store: LedgerStore) -> Result<Self> {
        Self::with_policy(store, IdPolicy::default(), DEFAULT_ID_WIDTH)
    }

    /// Folds the whole ledger once to rebuild the aggregate. The next sequence is the larger
    /// of the stored high-water mark and the highest id still in the file plus one.
    pub fn with_policy(store: LedgerStore, id_policy: IdPolicy, id_width: usize) -> Result<Self> {
        let mut next_sequence = store.high_water()?.unwrap_or(0);
        let aggregate = BalanceAggregate::fold(store.scan()?.map(|row| {
            let txn = row?;
            if let Some(seq) = txn.id.sequence() {
                next_sequence = next_sequence.max(seq.saturating_add(1));
            }
            Ok(txn)
        }))?;
        tracing::info!(
            path = %store.path().display(),
            transactions = aggregate.count(),
            income = aggregate.income(),
            expense = aggregate.expense(),
            "ledger opened"
        );
        Ok(Self {
            store,
            aggregate,
            id_policy,
            id_width,
            next_sequence,
        })
    }

    pub fn aggregate(&self) -> &BalanceAggregate {
        &self.aggregate
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Id the next created transaction will receive.
    pub fn next_id(&self) -> TransactionId {
        let sequence = match self.id_policy {
            IdPolicy::TransactionCount => self.aggregate.count(),
            IdPolicy::Sequential => self.next_sequence.max(self.aggregate.count()),
        };
        TransactionId::from_sequence(sequence, self.id_width)
    }

    pub fn create_transaction(&mut self, draft: NewTransaction) -> Result<TransactionId> {
        let id = self.next_id();
        let txn = Transaction::from_draft(id.clone(), draft);
        self.store.append(&txn)?;
        self.aggregate.apply_delta(Delta::created(txn.entry()))?;
        if let Some(seq) = id.sequence() {
            let next = seq.saturating_add(1);
            if next > self.next_sequence {
                self.next_sequence = next;
                self.store.record_high_water(next)?;
            }
        }
        tracing::debug!(id = %id, kind = %txn.kind, amount = txn.amount, "transaction created");
        Ok(id)
    }

    /// Returns `false` when no transaction carries `id`.
    pub fn update_transaction(&mut self, id: &TransactionId, patch: &TransactionPatch) -> Result<bool> {
        match self.store.update(id, patch)? {
            Some(delta) => {
                self.aggregate.apply_delta(delta)?;
                tracing::debug!(id = %id, "transaction updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Parses raw `(field, value)` pairs and applies them; `id` and unknown names are rejected
    /// before the ledger file is opened.
    pub fn update_fields<'a, I>(&mut self, id: &TransactionId, fields: I) -> Result<bool>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let patch = TransactionPatch::from_fields(fields)?;
        self.update_transaction(id, &patch)
    }

    /// Returns `false` when no transaction carries `id`.
    pub fn delete_transaction(&mut self, id: &TransactionId) -> Result<bool> {
        match self.store.delete(id)? {
            Some(entry) => {
                self.aggregate.apply_delta(Delta::deleted(entry))?;
                tracing::debug!(id = %id, "transaction deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn transactions(&self) -> Result<LedgerScan> {
        self.store.scan()
    }

    pub fn by_category<'a>(
        &self,
        category: &'a str,
    ) -> Result<impl Iterator<Item = Result<Transaction>> + 'a> {
        Ok(filtered(self.store.scan()?, move |txn| txn.category == category))
    }

    pub fn by_kind(
        &self,
        kind: TransactionKind,
    ) -> Result<impl Iterator<Item = Result<Transaction>>> {
        Ok(filtered(self.store.scan()?, move |txn| txn.kind == kind))
    }

    /// Amounts in `min..=max`.
    pub fn by_amount_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<impl Iterator<Item = Result<Transaction>>> {
        Ok(filtered(self.store.scan()?, move |txn| {
            (min..=max).contains(&txn.amount)
        }))
    }

    /// Timestamps between `start` and `end` inclusive, compared as fixed-format strings.
    pub fn by_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<impl Iterator<Item = Result<Transaction>>> {
        let (start, end) = (start.to_string(), end.to_string());
        Ok(filtered(self.store.scan()?, move |txn| {
            let stamp = txn.timestamp_string();
            start.as_str() <= stamp.as_str() && stamp.as_str() <= end.as_str()
        }))
    }

    /// Re-folds the ledger and compares it with the running aggregate.
    pub fn verify(&self) -> Result<()> {
        let rebuilt = BalanceAggregate::fold(self.store.scan()?)?;
        if rebuilt == self.aggregate {
            Ok(())
        } else {
            Err(LedgerError::AggregateDrift(format!(
                "running totals {:?} differ from ledger {:?}",
                self.aggregate, rebuilt
            )))
        }
    }
}

/// Applies `keep` to every successfully decoded row; errors pass through untouched.
fn filtered<F>(scan: LedgerScan, keep: F) -> impl Iterator<Item = Result<Transaction>>
where
    F: Fn(&Transaction) -> bool,
{
    scan.filter(move |row| match row {
        Ok(txn) => keep(txn),
        Err(_) => true,
    })
}
