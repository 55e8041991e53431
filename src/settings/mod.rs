mod file;
mod memory;

pub use file::FileSettingsStore;
pub use memory::MemorySettingsStore;

use crate::cli::Args;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no settings directory available on this platform")]
    NoDataDir,
}

/// String key/value storage that survives restarts.
pub trait SettingsStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    let dir = dirs::data_dir().ok_or(SettingsError::NoDataDir)?;
    Ok(dir.join("ollama-chat").join("settings.json"))
}

pub fn create_settings_store(args: &Args) -> Result<Arc<dyn SettingsStore>, SettingsError> {
    if args.ephemeral {
        info!("Settings are kept in memory only");
        return Ok(Arc::new(MemorySettingsStore::new()));
    }
    let path = match &args.settings_path {
        Some(path) => PathBuf::from(path),
        None => default_settings_path()?,
    };
    info!("Settings will be stored in: {}", path.display());
    Ok(Arc::new(FileSettingsStore::open(path)?))
}
