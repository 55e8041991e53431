use crate::models::chat::{ ChatMessage, RequestMessage };
use crate::settings::{ SettingsError, SettingsStore };
use log::{ error, info };
use std::sync::Arc;
use thiserror::Error;

pub const HISTORY_KEY: &str = "chatHistory";
pub const GREETING: &str = "Hallo Freddy. Wie kann ich dir helfen?";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize chat history: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// How `load` arrived at the current conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored(usize),
    Seeded,
    /// Stored history could not be decoded and was replaced by the greeting.
    Recovered,
}

/// The ordered conversation, mirrored into the settings store under `chatHistory`.
pub struct ConversationStore {
    settings: Arc<dyn SettingsStore>,
    messages: Vec<ChatMessage>,
}

impl ConversationStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            messages: Vec::new(),
        }
    }

    /// Reads the persisted history, seeding the greeting when there is none.
    pub fn load(&mut self) -> LoadOutcome {
        let Some(raw) = self.settings.get_string(HISTORY_KEY) else {
            self.seed();
            info!("No chat history found, starting with greeting");
            return LoadOutcome::Seeded;
        };

        match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
            Ok(messages) => {
                self.messages = messages;
                if self.is_empty() {
                    self.seed();
                    info!("Stored chat history is empty, starting with greeting");
                    return LoadOutcome::Seeded;
                }
                info!("Restored {} messages from chat history", self.len());
                LoadOutcome::Restored(self.len())
            }
            Err(e) => {
                error!("Stored chat history is malformed, starting over: {}", e);
                self.seed();
                LoadOutcome::Recovered
            }
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.messages)?;
        self.settings.set_string(HISTORY_KEY, &json)?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.persist()?;
        self.seed();
        self.persist()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn request_history(&self) -> Vec<RequestMessage> {
        self.messages.iter().map(RequestMessage::from).collect()
    }

    fn seed(&mut self) {
        self.messages = vec![ChatMessage::assistant(GREETING)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use crate::settings::MemorySettingsStore;

    fn store() -> (Arc<MemorySettingsStore>, ConversationStore) {
        let settings = Arc::new(MemorySettingsStore::new());
        let conversation = ConversationStore::new(settings.clone());
        (settings, conversation)
    }

    #[test]
    fn first_load_seeds_greeting() {
        let (_, mut conversation) = store();
        assert_eq!(conversation.load(), LoadOutcome::Seeded);
        assert_eq!(conversation.len(), 1);
        let greeting = &conversation.messages()[0];
        assert_eq!(greeting.role, Role::Assistant);
        assert_eq!(greeting.content, GREETING);
    }

    #[test]
    fn append_does_not_persist() {
        let (settings, mut conversation) = store();
        conversation.load();
        conversation.append(ChatMessage::user("hi"));
        assert_eq!(conversation.len(), 2);
        assert_eq!(settings.get_string(HISTORY_KEY), None);
    }

    #[test]
    fn persist_then_load_round_trips() {
        let (settings, mut conversation) = store();
        conversation.load();
        conversation.append(ChatMessage::user("Wie spät ist es?"));
        conversation.append(ChatMessage::assistant("Keine Ahnung."));
        conversation.persist().unwrap();

        let mut reloaded = ConversationStore::new(settings);
        assert_eq!(reloaded.load(), LoadOutcome::Restored(3));
        assert_eq!(reloaded.messages(), conversation.messages());
    }

    #[test]
    fn clear_leaves_only_persisted_greeting() {
        let (settings, mut conversation) = store();
        conversation.load();
        conversation.append(ChatMessage::user("one"));
        conversation.append(ChatMessage::assistant("two"));
        conversation.persist().unwrap();

        conversation.clear().unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content, GREETING);

        let mut reloaded = ConversationStore::new(settings);
        assert_eq!(reloaded.load(), LoadOutcome::Restored(1));
        assert_eq!(reloaded.messages()[0].content, GREETING);
    }

    #[test]
    fn malformed_history_recovers_to_greeting() {
        let (settings, mut conversation) = store();
        settings.set_string(HISTORY_KEY, "{not a list").unwrap();

        assert_eq!(conversation.load(), LoadOutcome::Recovered);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content, GREETING);
        // left untouched until the next persist
        assert_eq!(settings.get_string(HISTORY_KEY).as_deref(), Some("{not a list"));
    }

    #[test]
    fn request_history_keeps_order_without_timestamps() {
        let (_, mut conversation) = store();
        conversation.load();
        conversation.append(ChatMessage::user("hi"));
        let wire = conversation.request_history();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, Role::Assistant);
        assert_eq!(wire[1].content, "hi");
    }

    #[test]
    fn empty_stored_list_is_reseeded() {
        let (settings, mut conversation) = store();
        settings.set_string(HISTORY_KEY, "[]").unwrap();

        assert_eq!(conversation.load(), LoadOutcome::Seeded);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content, GREETING);
    }
}
