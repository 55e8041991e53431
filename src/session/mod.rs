use crate::config::{ AppConfig, ConfigError };
use crate::history::{ ConversationStore, LoadOutcome, StoreError };
use crate::llm::chat::ChatClient;
use crate::llm::ChatError;
use crate::models::chat::{ ChatMessage, RequestMessage };
use crate::settings::SettingsStore;
use log::{ error, info, warn };
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("message is empty")]
    Empty,
    #[error("a request is already in progress")]
    Busy,
    #[error("no request is pending")]
    NoPendingTurn,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Rejected(#[from] Rejected),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("chat history could not be saved: {0}")]
    Persist(#[from] StoreError),
}

/// An assistant reply that made it into the conversation. `unsaved` carries the
/// storage error when the history could not be written afterwards.
#[derive(Debug)]
pub struct Reply {
    pub message: ChatMessage,
    pub unsaved: Option<StoreError>,
}

/// Everything the inference request needs, detached from the session.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub history: Vec<RequestMessage>,
    pub base_url: String,
}

/// Owns the conversation and the in-flight guard for one chat screen.
///
/// A turn is `submit` followed by exactly one `complete`; between the two the
/// session stays in `TurnState::Sending` and rejects new input.
pub struct ChatSession {
    settings: Arc<dyn SettingsStore>,
    conversation: ConversationStore,
    config: AppConfig,
    state: TurnState,
    load_outcome: LoadOutcome,
}

impl ChatSession {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        let mut conversation = ConversationStore::new(settings.clone());
        let load_outcome = conversation.load();
        let config = AppConfig::load(settings.as_ref());
        info!("Chat session ready, inference server: {}", config.base_url);
        Self {
            settings,
            conversation,
            config,
            state: TurnState::Idle,
            load_outcome,
        }
    }

    pub fn submit(&mut self, input: &str) -> Result<PendingTurn, Rejected> {
        let content = input.trim();
        if content.is_empty() {
            return Err(Rejected::Empty);
        }
        if self.state == TurnState::Sending {
            warn!("Ignoring input while a request is in flight");
            return Err(Rejected::Busy);
        }

        self.conversation.append(ChatMessage::user(content));
        self.state = TurnState::Sending;
        Ok(PendingTurn {
            history: self.conversation.request_history(),
            base_url: self.config.base_url.clone(),
        })
    }

    /// Applies the outcome of the request started by the last `submit`.
    pub fn complete(&mut self, outcome: Result<String, ChatError>) -> Result<Reply, TurnError> {
        if self.state != TurnState::Sending {
            warn!("Dropping reply that arrived with no pending turn");
            return Err(Rejected::NoPendingTurn.into());
        }
        self.state = TurnState::Idle;
        let content = match outcome {
            Ok(content) => content,
            Err(e) => {
                error!("API Error: {}", e);
                return Err(e.into());
            }
        };

        let message = ChatMessage::assistant(content);
        self.conversation.append(message.clone());
        let unsaved = match self.conversation.persist() {
            Ok(()) => None,
            Err(e) => {
                error!("Reply received but chat history was not saved: {}", e);
                Some(e)
            }
        };
        Ok(Reply { message, unsaved })
    }

    /// Runs a whole turn on the current task.
    pub async fn send_message(
        &mut self,
        input: &str,
        client: &dyn ChatClient
    ) -> Result<Reply, TurnError> {
        let turn = self.submit(input)?;
        let outcome = client.send(&turn.history, &turn.base_url).await;
        self.complete(outcome)
    }

    pub fn clear(&mut self) -> Result<(), TurnError> {
        if self.state == TurnState::Sending {
            return Err(Rejected::Busy.into());
        }
        self.conversation.clear()?;
        info!("Chat history cleared");
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        let config = AppConfig { base_url: base_url.trim().to_string() };
        config.save(self.settings.as_ref())?;
        self.config = config;
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state == TurnState::Sending
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }
}
