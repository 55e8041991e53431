use super::{ SettingsError, SettingsStore };
use std::collections::HashMap;
use std::sync::{ Mutex, MutexGuard };

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
