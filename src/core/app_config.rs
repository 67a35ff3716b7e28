// Application Configuration
// Defaults compiled from config.yaml at build time
// Modify config.yaml and rebuild to change these values

// Include the auto-generated config from build.rs
pub mod compiled {
    include!(concat!(env!("OUT_DIR"), "/compiled_config.rs"));
}

/// Built-in defaults for album-sync
/// Values are compiled in from config.yaml at build time
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where albums live, where they go, and where state is kept
    pub paths: PathDefaults,

    /// File name patterns that make a file part of an album
    pub qualifying_patterns: Vec<String>,

    /// Default log level when RUST_LOG is not set
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct PathDefaults {
    /// Directory whose subdirectories are the albums
    pub source_root: String,

    /// Directory on the player that mirrors the selection
    pub destination: String,

    /// Mount point to check/mount before applying; empty means none
    pub mount_point: String,

    /// Persisted sync record
    pub record_file: String,

    /// Persisted selection
    pub selection_file: String,
}

impl Default for PathDefaults {
    fn default() -> Self {
        Self {
            source_root: compiled::SOURCE_ROOT.to_string(),
            destination: compiled::DESTINATION.to_string(),
            mount_point: compiled::MOUNT_POINT.to_string(),
            record_file: compiled::RECORD_FILE.to_string(),
            selection_file: compiled::SELECTION_FILE.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathDefaults::default(),
            qualifying_patterns: compiled::QUALIFYING_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_level: compiled::LOG_LEVEL.to_string(),
        }
    }
}
