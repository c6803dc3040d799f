//! Durable ledger file: append, lazy scan, and atomic single-row rewrites.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, WriterBuilder};

use crate::{
    domain::{Entry, Transaction, TransactionId, TransactionPatch},
    errors::{LedgerError, Result},
    ledger::Delta,
};

use super::{atomic, atomic::StagedReplace, codec};

/// Before and after snapshots of the row touched by a rewrite. `after` is `None` for a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub before: Transaction,
    pub after: Option<Transaction>,
}

impl Replacement {
    pub fn delta(&self) -> Delta {
        match &self.after {
            Some(after) => Delta::updated(self.before.entry(), after.entry()),
            None => Delta::deleted(self.before.entry()),
        }
    }
}

/// A fully written rewrite that has not yet replaced the ledger file.
#[derive(Debug)]
pub struct StagedRewrite {
    stage: StagedReplace,
    replacement: Replacement,
}

impl StagedRewrite {
    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    pub fn scratch(&self) -> &Path {
        self.stage.scratch()
    }

    pub fn commit(self) -> Result<Replacement> {
        self.stage.commit()?;
        Ok(self.replacement)
    }

    pub fn discard(self) {
        self.stage.discard();
    }
}

const SEQUENCE_EXTENSION: &str = "seq";

/// Sole owner of the ledger file and its id high-water mark.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    tmp: PathBuf,
    sequence: PathBuf,
    sequence_tmp: PathBuf,
}

impl LedgerStore {
    /// `tmp` is the scratch path reused by every rewrite. The high-water mark lives next to
    /// the ledger with a `.seq` extension.
    pub fn new(path: impl Into<PathBuf>, tmp: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tmp = tmp.into();
        Self {
            sequence: path.with_extension(SEQUENCE_EXTENSION),
            sequence_tmp: tmp.with_extension(SEQUENCE_EXTENSION),
            path,
            tmp,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scratch_path(&self) -> &Path {
        &self.tmp
    }

    pub fn sequence_path(&self) -> &Path {
        &self.sequence
    }

    pub fn sequence_scratch_path(&self) -> &Path {
        &self.sequence_tmp
    }

    /// Lowest id sequence never handed out, or `None` before the first recorded create.
    pub fn high_water(&self) -> Result<Option<u64>> {
        let raw = match fs::read_to_string(&self.sequence) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        raw.trim().parse().map(Some).map_err(|_| {
            LedgerError::Integrity(format!(
                "id high-water mark `{}` in {} is not a number",
                raw.trim(),
                self.sequence.display()
            ))
        })
    }

    /// Atomically replaces the stored high-water mark.
    pub fn record_high_water(&self, next: u64) -> Result<()> {
        atomic::replace_with(
            &self.sequence,
            &self.sequence_tmp,
            format!("{next}\n").as_bytes(),
        )
    }

    /// Resets the file to a bare header when it is missing or its header has the wrong shape.
    ///
    /// Returns `true` when the file was (re)written. Existing rows are discarded in that case.
    pub fn ensure_header(&self) -> Result<bool> {
        if self.path.exists() && self.has_expected_header()? {
            return Ok(false);
        }
        self.write_header()?;
        Ok(true)
    }

    fn has_expected_header(&self) -> Result<bool> {
        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut first = StringRecord::new();
        if !reader.read_record(&mut first)? {
            return Ok(false);
        }
        Ok(codec::is_header(&first))
    }

    fn write_header(&self) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer.write_record(&codec::header())?;
        let data = writer.into_inner().map_err(|err| err.into_error())?;
        atomic::replace_with(&self.path, &self.tmp, &data)
    }

    /// Appends one row. Existing rows are never rewritten.
    pub fn append(&self, txn: &Transaction) -> Result<()> {
        ensure_positive(txn.amount)?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(&codec::encode(txn))?;
        writer.flush()?;
        Ok(())
    }

    /// Streams every transaction from a fresh file handle.
    pub fn scan(&self) -> Result<LedgerScan> {
        let mut reader = open_reader(&self.path)?;
        check_header(&mut reader)?;
        Ok(LedgerScan {
            records: reader.into_records(),
        })
    }

    /// Rewrites the ledger with the row for `id` passed through `mutate`.
    ///
    /// `mutate` returning `None` drops the row. When no row carries `id` the ledger file is
    /// left untouched and `None` is returned.
    pub fn replace_matching<F>(&self, id: &TransactionId, mutate: F) -> Result<Option<Replacement>>
    where
        F: FnOnce(Transaction) -> Option<Transaction>,
    {
        match self.stage_matching(id, mutate)? {
            Some(staged) => staged.commit().map(Some),
            None => Ok(None),
        }
    }

    /// Performs the full rewrite of [`replace_matching`](Self::replace_matching) into the
    /// scratch file and stops short of the rename.
    pub fn stage_matching<F>(&self, id: &TransactionId, mutate: F) -> Result<Option<StagedRewrite>>
    where
        F: FnOnce(Transaction) -> Option<Transaction>,
    {
        let mut reader = open_reader(&self.path)?;
        check_header(&mut reader)?;

        let (stage, scratch) = StagedReplace::begin(&self.path, &self.tmp)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(scratch);
        writer.write_record(&codec::header())?;

        let mut mutate = Some(mutate);
        let mut replacement = None;
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            if replacement.is_none() && record.get(0) == Some(id.as_str()) {
                if let Some(mutate) = mutate.take() {
                    let before = codec::decode(&record)?;
                    let after = mutate(before.clone());
                    if let Some(after) = &after {
                        writer.write_record(&codec::encode(after))?;
                    }
                    replacement = Some(Replacement { before, after });
                    continue;
                }
            }
            writer.write_record(&record)?;
        }

        let Some(replacement) = replacement else {
            return Ok(None);
        };
        let scratch = writer.into_inner().map_err(|err| err.into_error())?;
        scratch.sync_all()?;
        drop(scratch);

        Ok(Some(StagedRewrite { stage, replacement }))
    }

    /// Removes the row for `id`, returning its kind and amount.
    pub fn delete(&self, id: &TransactionId) -> Result<Option<Entry>> {
        let replaced = self.replace_matching(id, |_| None)?;
        Ok(replaced.map(|replacement| replacement.before.entry()))
    }

    /// Merges `patch` into the row for `id`, returning the before/after kind and amount.
    pub fn update(&self, id: &TransactionId, patch: &TransactionPatch) -> Result<Option<Delta>> {
        if let Some(amount) = patch.amount {
            ensure_positive(amount)?;
        }
        let replaced = self.replace_matching(id, |mut txn| {
            txn.apply_patch(patch);
            Some(txn)
        })?;
        Ok(replaced.map(|replacement| replacement.delta()))
    }
}

/// Lazy iterator over the ledger rows. Holds its own file handle until dropped.
pub struct LedgerScan {
    records: StringRecordsIntoIter<File>,
}

impl Iterator for LedgerScan {
    type Item = Result<Transaction>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map_err(LedgerError::from)
                .and_then(|record| codec::decode(&record)),
        )
    }
}

/// Rows with a zero amount would be refused by the decoder on the next scan.
fn ensure_positive(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidMutation(
            "transaction amount must be a positive integer".into(),
        ));
    }
    Ok(())
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn check_header(reader: &mut csv::Reader<File>) -> Result<()> {
    let headers = reader.headers()?;
    if codec::is_header(headers) {
        Ok(())
    } else {
        Err(LedgerError::Integrity(format!(
            "unexpected ledger header `{}`",
            headers.iter().collect::<Vec<_>>().join(",")
        )))
    }
}
