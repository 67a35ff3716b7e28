// Pattern Matching Utilities
// Glob-like matching that decides which files inside an album qualify for syncing

use std::path::Path;

/// Check if a file name matches a pattern (case-insensitive)
pub fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    let name = file_name.to_lowercase();
    let pattern = pattern.to_lowercase();

    if let Some(suffix) = pattern.strip_prefix('*') {
        // Wildcard at start: match suffix
        name.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        // Wildcard at end: match prefix
        name.starts_with(prefix)
    } else if let Some((head, tail)) = pattern.split_once('*') {
        name.len() >= head.len() + tail.len() && name.starts_with(head) && name.ends_with(tail)
    } else {
        name == pattern
    }
}

/// Decides whether a file inside an item directory is part of the item
#[derive(Debug, Clone, Default)]
pub struct QualifyingMatcher {
    patterns: Vec<String>,
}

impl QualifyingMatcher {
    /// Create a new matcher with the given patterns
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Check if a path qualifies. Only the final component is considered;
    /// with no patterns configured every file qualifies.
    pub fn qualifies(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        self.patterns.iter().any(|p| matches_pattern(&name, p))
    }

    /// Get all patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
