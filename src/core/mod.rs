// Core infrastructure module
// Configuration, persisted selection and the sync session built on the operations

pub mod app_config;
pub mod selection;
pub mod session;
pub mod session_config;

pub use app_config::AppConfig;
pub use selection::SelectionStore;
pub use session::{ItemStatus, Session, SyncOutcome};
pub use session_config::{SessionConfig, Settings, CONFIG_FILE_NAME};
