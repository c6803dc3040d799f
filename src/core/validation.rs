//! Field-level checks run before any mutation reaches the ledger.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::{
    domain::{NewTransaction, TransactionKind, TransactionPatch, TIMESTAMP_FORMAT},
    errors::{LedgerError, Result},
};

/// Validates raw field values against the known categories.
pub struct TransactionValidator<'a> {
    categories: &'a HashSet<String>,
}

impl<'a> TransactionValidator<'a> {
    pub fn new(categories: &'a HashSet<String>) -> Self {
        Self { categories }
    }

    pub fn validate_kind(&self, value: &str) -> bool {
        value.parse::<TransactionKind>().is_ok()
    }

    pub fn validate_amount(&self, value: &str) -> bool {
        matches!(value.trim().parse::<u64>(), Ok(amount) if amount > 0)
    }

    pub fn validate_date_time(&self, value: &str) -> bool {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
    }

    pub fn validate_category(&self, value: &str) -> bool {
        self.categories.contains(value)
    }

    /// Checks every `(field, value)` pair, failing on the first illegal one.
    pub fn validate_fields<'f, I>(&self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'f str, &'f str)>,
    {
        for (field, value) in fields {
            let valid = match field {
                "type" => self.validate_kind(value),
                "amount" => self.validate_amount(value),
                "date_time" => self.validate_date_time(value),
                "category" => self.validate_category(value),
                "note" => true,
                other => return Err(LedgerError::Validation(format!("Unknown field: {other}"))),
            };
            if !valid {
                return Err(LedgerError::Validation(format!(
                    "Invalid {}: {value}",
                    label(field)
                )));
            }
        }
        Ok(())
    }

    /// Validates a complete set of creation fields and builds the draft.
    pub fn draft<'f, I>(&self, fields: I) -> Result<NewTransaction>
    where
        I: IntoIterator<Item = (&'f str, &'f str)>,
    {
        let fields: Vec<(&str, &str)> = fields.into_iter().collect();
        self.validate_fields(fields.iter().copied())?;
        let patch = TransactionPatch::from_fields(fields.iter().copied())
            .map_err(|err| LedgerError::Validation(err.to_string()))?;
        let missing = |name: &str| LedgerError::Validation(format!("Missing field: {name}"));
        Ok(NewTransaction {
            kind: patch.kind.ok_or_else(|| missing("type"))?,
            amount: patch.amount.ok_or_else(|| missing("amount"))?,
            timestamp: patch.timestamp.ok_or_else(|| missing("date_time"))?,
            category: patch.category.ok_or_else(|| missing("category"))?,
            note: patch.note.unwrap_or_default(),
        })
    }
}

fn label(field: &str) -> &str {
    match field {
        "date_time" => "date and time",
        other => other,
    }
}
