//! Per-workspace LangSmith settings persistence.

mod settings;
mod store;

pub use settings::WorkspaceSettings;
pub use store::{SettingsStore, StoreError};
