//! On-disk layout of a cashbook database and its startup self-healing.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{core::utils::ensure_dir, errors::Result};

use super::{CategoryStore, LedgerStore};

const DATABASE_DIR: &str = "database";
const TEMPORARY_DIR: &str = "temporary_files";
const TRANSACTIONS_FILE: &str = "transactions.csv";
const CATEGORIES_FILE: &str = "categories.txt";
const LEDGER_SCRATCH: &str = "tmp.csv";
const CATEGORY_SCRATCH: &str = "tmp.txt";

/// Categories written when the category file is missing or empty.
pub const DEFAULT_CATEGORIES: [&str; 11] = [
    "food",
    "transportation",
    "contact fee",
    "clothes",
    "electric bill",
    "medical",
    "housing expense",
    "exchange",
    "houseware",
    "cosmetic",
    "education",
];

/// Resolved paths of every file a cashbook database owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLayout {
    pub root: PathBuf,
    pub database: PathBuf,
    pub transactions: PathBuf,
    pub categories: PathBuf,
    pub temporary_files: PathBuf,
    pub tmp_csv: PathBuf,
    pub tmp_txt: PathBuf,
}

impl DatabaseLayout {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let database = root.join(DATABASE_DIR);
        let temporary_files = database.join(TEMPORARY_DIR);
        Self {
            transactions: database.join(TRANSACTIONS_FILE),
            categories: database.join(CATEGORIES_FILE),
            tmp_csv: temporary_files.join(LEDGER_SCRATCH),
            tmp_txt: temporary_files.join(CATEGORY_SCRATCH),
            root,
            database,
            temporary_files,
        }
    }

    pub fn ledger_store(&self) -> LedgerStore {
        LedgerStore::new(&self.transactions, &self.tmp_csv)
    }

    pub fn category_store(&self) -> CategoryStore {
        CategoryStore::new(&self.categories, &self.tmp_txt)
    }

    /// Brings the database into a usable state.
    ///
    /// Creates missing directories, drops scratch files left behind by an interrupted
    /// rewrite, resets a ledger whose header is missing or foreign, and seeds
    /// `default_categories` into an empty category file.
    pub fn initialize<S: AsRef<str>>(&self, default_categories: &[S]) -> Result<()> {
        ensure_dir(&self.database)?;
        ensure_dir(&self.temporary_files)?;

        let ledger = self.ledger_store();
        for scratch in [
            self.tmp_csv.as_path(),
            self.tmp_txt.as_path(),
            ledger.sequence_scratch_path(),
        ] {
            remove_stale(scratch)?;
        }

        if ledger.ensure_header()? {
            tracing::warn!(
                path = %self.transactions.display(),
                "ledger file missing or header mismatched; wrote a fresh header"
            );
        }

        let categories = self.category_store();
        if categories.is_empty()? {
            categories.write_all(default_categories.iter().map(|name| name.as_ref()))?;
            tracing::info!(count = default_categories.len(), "seeded default categories");
        }

        tracing::info!(root = %self.database.display(), "database initialized");
        Ok(())
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {
            tracing::warn!(path = %path.display(), "discarding scratch file from an interrupted rewrite");
            fs::remove_file(path)?;
            Ok(())
        }
        Ok(_) => {
            fs::remove_file(path)?;
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
