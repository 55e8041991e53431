pub mod chat;

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid inference URL '{0}'")]
    InvalidUrl(String),
    #[error("request to inference server failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference server answered with status {0}")]
    Status(StatusCode),
    #[error("no valid content in response")]
    EmptyContent,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
