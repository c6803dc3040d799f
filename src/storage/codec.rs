//! Row encoding for the ledger file.

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::{
    domain::{Transaction, TransactionId, TransactionKind, TIMESTAMP_FORMAT},
    errors::{LedgerError, Result},
};

/// Field names, in file order. The first line of every ledger file.
pub const FIELDNAMES: [&str; 6] = ["id", "type", "amount", "date_time", "category", "note"];

const NOTE_INDEX: usize = 5;

/// Returns the header row written at the top of the ledger file.
pub fn header() -> StringRecord {
    StringRecord::from(FIELDNAMES.to_vec())
}

/// True when `record` is exactly the expected header.
pub fn is_header(record: &StringRecord) -> bool {
    record.len() == FIELDNAMES.len() && record.iter().zip(FIELDNAMES).all(|(a, b)| a == b)
}

pub fn encode(txn: &Transaction) -> StringRecord {
    let amount = txn.amount.to_string();
    let timestamp = txn.timestamp_string();
    StringRecord::from(vec![
        txn.id.as_str(),
        txn.kind.as_str(),
        amount.as_str(),
        timestamp.as_str(),
        txn.category.as_str(),
        txn.note.as_str(),
    ])
}

/// Decodes one data row. A trailing `note` may be absent; any other shape is an integrity error.
pub fn decode(record: &StringRecord) -> Result<Transaction> {
    if record.len() != FIELDNAMES.len() && record.len() != NOTE_INDEX {
        return Err(integrity(
            record,
            format!(
                "expected {} fields, found {}",
                FIELDNAMES.len(),
                record.len()
            ),
        ));
    }

    let id = field(record, 0)?;
    if id.is_empty() {
        return Err(integrity(record, "empty id".into()));
    }
    let kind: TransactionKind = field(record, 1)?
        .parse()
        .map_err(|err: LedgerError| integrity(record, err.to_string()))?;
    let raw_amount = field(record, 2)?;
    let amount = match raw_amount.parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => return Err(integrity(record, format!("invalid amount `{raw_amount}`"))),
    };
    let raw_timestamp = field(record, 3)?;
    let timestamp = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
        .map_err(|_| integrity(record, format!("invalid date_time `{raw_timestamp}`")))?;
    let category = field(record, 4)?.to_string();
    let note = record.get(NOTE_INDEX).unwrap_or_default().to_string();

    Ok(Transaction {
        id: TransactionId::new(id),
        kind,
        amount,
        timestamp,
        category,
        note,
    })
}

fn field<'r>(record: &'r StringRecord, index: usize) -> Result<&'r str> {
    record
        .get(index)
        .ok_or_else(|| integrity(record, format!("missing field `{}`", FIELDNAMES[index])))
}

fn integrity(record: &StringRecord, detail: String) -> LedgerError {
    let line = record
        .position()
        .map(|pos| pos.line().to_string())
        .unwrap_or_else(|| "?".into());
    LedgerError::Integrity(format!("ledger row at line {line}: {detail}"))
}
