//! Plain-text category file, one name per line.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Lines, Write},
    path::{Path, PathBuf},
};

use crate::errors::{LedgerError, Result};

use super::atomic::StagedReplace;

#[derive(Debug, Clone)]
pub struct CategoryStore {
    path: PathBuf,
    tmp: PathBuf,
}

impl CategoryStore {
    pub fn new(path: impl Into<PathBuf>, tmp: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tmp: tmp.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file is missing or holds no bytes.
    pub fn is_empty(&self) -> Result<bool> {
        match self.path.metadata() {
            Ok(meta) => Ok(meta.len() == 0),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    pub fn append(&self, name: &str) -> Result<()> {
        check_single_line(name)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{name}")?;
        Ok(())
    }

    /// Streams trimmed names from a fresh handle; blank lines are skipped.
    pub fn scan(&self) -> Result<CategoryScan> {
        let file = File::open(&self.path)?;
        Ok(CategoryScan {
            lines: BufReader::new(file).lines(),
        })
    }

    /// Replaces the whole file with `names`.
    pub fn write_all<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = names.into_iter().collect();
        for name in &names {
            check_single_line(name)?;
        }
        let (stage, file) = StagedReplace::begin(&self.path, &self.tmp)?;
        let mut out = std::io::BufWriter::new(file);
        for name in names {
            writeln!(out, "{name}")?;
        }
        let file = out.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        drop(file);
        stage.commit()
    }

    /// Removes every line equal to `name`. Returns whether anything was removed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let (stage, file) = StagedReplace::begin(&self.path, &self.tmp)?;
        let mut out = std::io::BufWriter::new(file);
        let mut removed = false;
        for line in self.scan()? {
            let line = line?;
            if line == name {
                removed = true;
            } else {
                writeln!(out, "{line}")?;
            }
        }
        if !removed {
            stage.discard();
            return Ok(false);
        }
        let file = out.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        drop(file);
        stage.commit()?;
        Ok(true)
    }
}

fn check_single_line(name: &str) -> Result<()> {
    if name.contains(|c: char| c == '\n' || c == '\r') {
        return Err(LedgerError::Validation(format!(
            "category name cannot contain a line break: {name:?}"
        )));
    }
    Ok(())
}

/// Lazy iterator over category names.
pub struct CategoryScan {
    lines: Lines<BufReader<File>>,
}

impl Iterator for CategoryScan {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(trimmed.to_string()));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}
