pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ ChatError, LlmConfig };
use self::ollama::OllamaClient;
use crate::models::chat::RequestMessage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the whole conversation and returns the complete assistant reply.
    async fn send(
        &self,
        history: &[RequestMessage],
        base_url: &str
    ) -> Result<String, ChatError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    Ok(Arc::new(OllamaClient::from_config(config)?))
}
