//! Conversation snapshot passed into every pipeline run

use serde::{Deserialize, Serialize};

/// Who sent a chat message
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Human,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            content: content.into(),
        }
    }
}

/// Immutable view of one session's conversation at request time.
///
/// Persisting history is the caller's job; the pipeline only reads it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ConversationState {
    pub session_id: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ConversationState {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}
