use serde::{Deserialize, Serialize};

use super::{Persisted, PersistedState};
use crate::model::{ChatMessage, ChatRole};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

/// Coaching chat log. Local-only: generating the coach's replies is
/// someone else's job; this container just keeps the transcript.
#[derive(Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatBlob {
    messages: Vec<ChatMessage>,
}

impl PersistedState for ChatState {
    const KEY: StorageKey = StorageKey::Chat;
    type Blob = ChatBlob;

    fn partialize(&self) -> ChatBlob {
        ChatBlob {
            messages: self.messages.clone(),
        }
    }

    fn apply_blob(&mut self, blob: ChatBlob) {
        self.messages = blob.messages;
    }
}

pub type ChatStore<B = crate::storage::adapter::PersistenceAdapter> = Persisted<ChatState, B>;

impl<B: StateBackend> ChatStore<B> {
    pub fn append(&mut self, role: ChatRole, text: String) {
        self.update(|s| s.messages.push(ChatMessage::new(role, text)));
    }

    pub fn clear(&mut self) {
        self.reset();
    }
}
