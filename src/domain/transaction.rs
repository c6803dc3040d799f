//! Transaction records as they live in the ledger file.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Textual layout of every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Direction of money flow for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(LedgerError::UnknownKind(other.to_string())),
        }
    }
}

/// Zero-padded decimal identifier assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    /// Formats `value` as a zero-padded id of `width` digits.
    pub fn from_sequence(value: u64, width: usize) -> Self {
        Self(format!("{:0width$}", value, width = width))
    }

    /// Wraps an id read back from storage or supplied by a caller.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is purely decimal.
    pub fn sequence(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single persisted income or expense entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: u64,
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub note: String,
}

impl Transaction {
    /// Builds the stored form of a draft once an id has been assigned.
    pub fn from_draft(id: TransactionId, draft: NewTransaction) -> Self {
        Self {
            id,
            kind: draft.kind,
            amount: draft.amount,
            timestamp: draft.timestamp,
            category: draft.category,
            note: draft.note,
        }
    }

    /// Timestamp rendered in the fixed storage layout.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Kind and amount pair consumed by the balance aggregate.
    pub fn entry(&self) -> Entry {
        Entry {
            kind: self.kind,
            amount: self.amount,
        }
    }

    /// Merges every populated field of `patch` into this record. The id is never touched.
    pub fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
    }
}

/// Fields supplied by a caller creating a transaction; the id is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: u64,
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub note: String,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionKind,
        amount: u64,
        timestamp: NaiveDateTime,
        category: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            amount,
            timestamp,
            category: category.into(),
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Partial update for an existing transaction. There is deliberately no id field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount: Option<u64>,
    pub timestamp: Option<NaiveDateTime>,
    pub category: Option<String>,
    pub note: Option<String>,
}

impl TransactionPatch {
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &TransactionPatch::default()
    }

    /// Builds a patch from raw `(field, value)` pairs using the storage field names.
    ///
    /// Setting `id` or naming an unknown field is rejected before anything touches disk.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut patch = TransactionPatch::default();
        for (field, value) in fields {
            match field {
                "id" => {
                    return Err(LedgerError::InvalidMutation(
                        "transaction id cannot be updated".into(),
                    ))
                }
                "type" => {
                    patch.kind = Some(value.parse().map_err(|_| {
                        LedgerError::InvalidMutation(format!("invalid type: {value}"))
                    })?)
                }
                "amount" => patch.amount = Some(parse_amount(value)?),
                "date_time" => patch.timestamp = Some(parse_timestamp(value)?),
                "category" => patch.category = Some(value.to_string()),
                "note" => patch.note = Some(value.to_string()),
                other => {
                    return Err(LedgerError::InvalidMutation(format!(
                        "unknown field: {other}"
                    )))
                }
            }
        }
        Ok(patch)
    }
}

/// Kind and amount of one transaction as seen by the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub kind: TransactionKind,
    pub amount: u64,
}

impl Entry {
    pub fn new(kind: TransactionKind, amount: u64) -> Self {
        Self { kind, amount }
    }
}

fn parse_amount(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(LedgerError::InvalidMutation(format!(
            "invalid amount: {value}"
        ))),
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| LedgerError::InvalidMutation(format!("invalid date and time: {value}")))
}
