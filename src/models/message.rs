//! Conversation message type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChatMessage, Role};

/// A message in the visible transcript.
///
/// User messages are immutable once appended. The in-flight assistant
/// message grows through [`Message::append`] as stream chunks arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id and the current timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Append a streamed delta to the content.
    pub fn append(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// The wire form sent back to the server as history.
    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}
