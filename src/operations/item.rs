// Items and selection
// An item is one album directory under the source root, identified by its name

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, SyncError};
use crate::utilities::item_name;

/// A syncable source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Directory name; unique within the source root and used as the key everywhere
    pub name: String,
    /// Full path of the directory inside the source root
    pub source_path: PathBuf,
}

impl Item {
    pub fn new(name: impl Into<String>, source_root: &Path) -> Self {
        let name = name.into();
        let source_path = source_root.join(&name);
        Self { name, source_path }
    }
}

/// List item directories directly under `source_root`, sorted by name.
/// Plain files are not items; non UTF-8 names are skipped with a warning.
pub fn list_items(source_root: &Path) -> Result<Vec<Item>> {
    let listing_err = |source: std::io::Error| SyncError::Listing {
        path: source_root.to_path_buf(),
        source,
    };

    let mut items = Vec::new();
    for entry in fs::read_dir(source_root).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }

        match item_name(&path) {
            Some(name) => items.push(Item {
                name: name.to_string(),
                source_path: path.clone(),
            }),
            None => warn!("Skipping directory with non UTF-8 name: {}", path.display()),
        }
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Names the user wants on the destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns true if the name was not selected before
    pub fn select(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Returns true if the name was selected before
    pub fn deselect(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Flip the selection of `name`; returns the new state
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.deselect(name) {
            false
        } else {
            self.select(name)
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
