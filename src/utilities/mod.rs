// Utilities module
// Helper functions and tools

pub mod paths;
pub mod patterns;

pub use paths::{
    expand_home, is_item_name, item_name, normalize_path, resolve_path, truncate_name,
};
pub use patterns::{matches_pattern, QualifyingMatcher};
