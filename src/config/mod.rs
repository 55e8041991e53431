use crate::settings::{ SettingsError, SettingsStore };
use log::info;
use thiserror::Error;
use url::Url;

pub const API_URL_KEY: &str = "apiUrl";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Stored `apiUrl`, or the default endpoint when nothing is stored.
    pub fn load(settings: &dyn SettingsStore) -> Self {
        match settings.get_string(API_URL_KEY) {
            Some(url) if !url.trim().is_empty() => Self { base_url: url },
            _ => Self::default(),
        }
    }

    pub fn save(&self, settings: &dyn SettingsStore) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)?;
        settings.set_string(API_URL_KEY, &self.base_url)?;
        info!("Saved inference base URL: {}", self.base_url);
        Ok(())
    }
}

/// Accepts absolute http(s) URLs without query or fragment.
pub fn validate_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".to_string()));
    }
    Ok(url)
}
