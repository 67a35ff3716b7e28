// Path Utilities
// Helper functions for path manipulation

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);

    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}

/// Resolve a configured path: `~` expansion, then relative to a base directory
pub fn resolve_path(base: &Path, configured: &str) -> PathBuf {
    let expanded = expand_home(configured);
    if expanded.is_absolute() {
        normalize_path(&expanded)
    } else {
        normalize_path(&base.join(expanded))
    }
}

/// Check if a path is inside a directory
pub fn is_inside(path: &Path, directory: &Path) -> bool {
    let path = normalize_path(path);
    let directory = normalize_path(directory);

    path.starts_with(&directory)
}

/// Final component of a path as an item name, if it is valid UTF-8
pub fn item_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// An item name must be exactly one plain path component: no separators,
/// no `.`/`..`, not empty and not absolute
pub fn is_item_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}

/// Shorten a name for column display, marking the cut with an ellipsis
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }

    let mut short: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('\u{2026}');
    short
}
