//! Write-to-temp-then-rename replacement of a whole file.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::errors::Result;

/// A rewrite of `target` staged in a scratch file.
///
/// The target is only changed by [`StagedReplace::commit`]. Dropping a stage that was
/// never committed removes the scratch file, so an aborted rewrite leaves no trace.
#[derive(Debug)]
pub struct StagedReplace {
    tmp: PathBuf,
    target: PathBuf,
    armed: bool,
}

impl StagedReplace {
    /// Creates (or truncates) the scratch file and returns it for writing.
    pub fn begin(target: &Path, tmp: &Path) -> Result<(Self, File)> {
        if let Some(parent) = tmp.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(tmp)?;
        let stage = Self {
            tmp: tmp.to_path_buf(),
            target: target.to_path_buf(),
            armed: true,
        };
        Ok((stage, file))
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn scratch(&self) -> &Path {
        &self.tmp
    }

    /// Moves the fully written scratch file over the target in one rename.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target)?;
        self.armed = false;
        tracing::debug!(target = %self.target.display(), "atomic replace committed");
        Ok(())
    }

    /// Abandons the rewrite; the target is left untouched.
    pub fn discard(self) {}
}

impl Drop for StagedReplace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.tmp) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    scratch = %self.tmp.display(),
                    error = %err,
                    "failed to remove abandoned scratch file"
                );
            }
        }
    }
}

/// Writes `data` to `target` through `tmp`, syncing before the rename.
pub fn replace_with(target: &Path, tmp: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let (stage, mut file) = StagedReplace::begin(target, tmp)?;
    file.write_all(data)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);
    stage.commit()
}
