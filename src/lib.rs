// Album Sync Library
// Mirrors a selection of album directories onto a mounted destination

// Core infrastructure - configuration and sync sessions
pub mod core;

// Operations - change detection, planning, apply and persisted state
pub mod operations;

// Utilities - helper functions and tools
pub mod utilities;

// Error types shared by the library
pub mod error;

// Subscriber setup for binaries
pub mod logging;

// Re-export commonly used items for convenience
pub use self::core::{AppConfig, Session, SessionConfig, Settings, SyncOutcome};
pub use error::{BackendError, ConfigError, SyncError};
pub use operations::{
    plan, ApplyEngine, ChangeDetector, Fingerprint, LocalBackend, Plan, RecordStore,
    Selection, StorageBackend, SyncRecord,
};
