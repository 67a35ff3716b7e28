// Error types
// Library-level failures; the binary wraps these with anyhow context

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single storage backend call
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited unsuccessfully: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("destination {0} is not mounted")]
    NotMounted(PathBuf),
}

impl BackendError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Failures surfaced by the sync core
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to read source listing {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write sync record {path}: {source}")]
    RecordIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize sync record: {0}")]
    RecordFormat(#[from] serde_json::Error),

    #[error("Refusing to touch {0:?}: not a plain item name")]
    InvalidName(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Invalid configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source root {0} does not exist or is not a directory")]
    MissingSource(PathBuf),

    #[error("Destination {destination} lies inside the source root {source_root}")]
    DestinationInsideSource {
        destination: PathBuf,
        source_root: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
