// Selection Store
// Persists which albums the user has marked, as a YAML list of names

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::operations::Selection;

#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved selection; `Ok(None)` when nothing was saved yet
    pub fn load(&self) -> Result<Option<Selection>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read selection: {}", self.path.display()))?;

        let selection: Selection = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse selection: {}", self.path.display()))?;

        Ok(Some(selection))
    }

    pub fn save(&self, selection: &Selection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_yaml::to_string(selection).context("Failed to serialize selection")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write selection: {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_selection_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SelectionStore::new(dir.path().join("selection.yaml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SelectionStore::new(dir.path().join("state").join("selection.yaml"));

        let selection: Selection = ["Abbey Road", "Kind of Blue"].into_iter().collect();
        store.save(&selection).unwrap();

        assert_eq!(store.load().unwrap(), Some(selection));
    }

    #[test]
    fn test_corrupt_selection_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selection.yaml");
        fs::write(&path, "key: [unterminated").unwrap();

        assert!(SelectionStore::new(path).load().is_err());
    }
}
