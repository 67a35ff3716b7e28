// Operations module
// Business logic for change detection, planning, applying and persisting sync state

pub mod apply;
pub mod backend;
pub mod fingerprint;
pub mod item;
pub mod plan;
pub mod record;
pub mod rollback;

pub use apply::{ApplyEngine, ApplyFailure, ApplyResult, Progress};
pub use backend::{BackendResult, LocalBackend, StorageBackend};
pub use fingerprint::{ChangeDetector, Fingerprint, Fingerprinter};
pub use item::{list_items, Item, Selection};
pub use plan::{plan, Action, Plan, PlanStep, PlanSummary};
pub use record::{RecordStore, SyncRecord};
