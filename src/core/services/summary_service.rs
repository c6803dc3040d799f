use std::collections::BTreeMap;

use crate::{
    domain::{Transaction, TransactionKind},
    errors::Result,
};

/// Expense totals per category plus the overall expense total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub per_category: BTreeMap<String, u64>,
    pub total: u64,
}

impl CategoryBreakdown {
    /// Share of the total spent in `category`, in percent.
    pub fn percentage(&self, category: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let amount = self.per_category.get(category).copied().unwrap_or_default();
        amount as f64 / self.total as f64 * 100.0
    }
}

pub struct SummaryService;

impl SummaryService {
    /// Sums expenses by category. Every name in `categories` appears, even at zero; expenses
    /// filed under a category that no longer exists are still counted under that name.
    pub fn expense_by_category<'a, C, I>(categories: C, rows: I) -> Result<CategoryBreakdown>
    where
        C: IntoIterator<Item = &'a str>,
        I: IntoIterator<Item = Result<Transaction>>,
    {
        let mut breakdown = CategoryBreakdown {
            per_category: categories.into_iter().map(|name| (name.to_string(), 0)).collect(),
            total: 0,
        };
        for row in rows {
            let txn = row?;
            if txn.kind != TransactionKind::Expense {
                continue;
            }
            breakdown.total += txn.amount;
            *breakdown.per_category.entry(txn.category).or_default() += txn.amount;
        }
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionId;
    use chrono::NaiveDate;

    fn txn(kind: TransactionKind, amount: u64, category: &str) -> Result<Transaction> {
        Ok(Transaction {
            id: TransactionId::new("000000000"),
            kind,
            amount,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            category: category.into(),
            note: String::new(),
        })
    }

    #[test]
    fn breakdown_counts_expenses_only() {
        let rows = vec![
            txn(TransactionKind::Expense, 30, "food"),
            txn(TransactionKind::Income, 500, "salary"),
            txn(TransactionKind::Expense, 10, "retired"),
        ];
        let breakdown = SummaryService::expense_by_category(["food", "rent"], rows).unwrap();
        assert_eq!(breakdown.total, 40);
        assert_eq!(breakdown.per_category["food"], 30);
        assert_eq!(breakdown.per_category["rent"], 0);
        assert_eq!(breakdown.per_category["retired"], 10);
        assert!(!breakdown.per_category.contains_key("salary"));
        assert!((breakdown.percentage("food") - 75.0).abs() < f64::EPSILON);
    }
}
