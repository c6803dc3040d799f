use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{app_data_dir, config_file_in, ensure_dir},
    errors::Result,
    storage::{atomic, DEFAULT_CATEGORIES},
};

const TMP_SUFFIX: &str = "tmp";
const DEFAULT_ID_WIDTH: usize = 9;

/// How the service picks the id of a new transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// One past the highest id ever seen, never below the live count.
    #[default]
    Sequential,
    /// The live transaction count. Can hand out an id again after a delete.
    TransactionCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub id_width: usize,
    pub id_policy: IdPolicy,
    pub default_categories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_width: DEFAULT_ID_WIDTH,
            id_policy: IdPolicy::default(),
            default_categories: DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Loads the stored configuration, falling back to defaults when none exists.
    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        atomic::replace_with(&self.path, &tmp_path(&self.path), json.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.id_width, 9);
        assert_eq!(config.id_policy, IdPolicy::Sequential);
        assert_eq!(config.default_categories.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = Config {
            id_policy: IdPolicy::TransactionCount,
            default_categories: vec!["salary".into()],
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "id_policy": "transaction_count" }"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.id_policy, IdPolicy::TransactionCount);
        assert_eq!(config.id_width, 9);
    }
}
