use std::collections::HashSet;

use crate::{errors::Result, storage::CategoryStore};

/// In-memory category set mirrored to the category file.
///
/// Removing a category does not check whether transactions still reference it.
pub struct CategoryService {
    store: CategoryStore,
    categories: HashSet<String>,
}

impl CategoryService {
    pub fn open(store: CategoryStore) -> Result<Self> {
        let categories = store.scan()?.collect::<Result<HashSet<_>>>()?;
        Ok(Self { store, categories })
    }

    /// Adds `name` (trimmed, lowercased). Returns `false` if it was already known.
    ///
    /// Names spanning more than one line are a validation error.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        let name = normalize(name);
        if name.is_empty() || self.categories.contains(&name) {
            return Ok(false);
        }
        self.store.append(&name)?;
        tracing::debug!(category = %name, "category added");
        self.categories.insert(name);
        Ok(true)
    }

    /// Removes `name` from the file and the set. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let name = normalize(name);
        let removed = self.store.delete(&name)?;
        let known = self.categories.remove(&name);
        if removed || known {
            tracing::debug!(category = %name, "category removed");
        }
        Ok(removed || known)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains(name)
    }

    /// Category names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn set(&self) -> &HashSet<String> {
        &self.categories
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
