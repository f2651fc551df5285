use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the intake conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single transcript entry. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, insertion-ordered conversation transcript.
///
/// Message ids are unique within the log and monotonic by creation time.
/// There is deliberately no operation to remove, reorder or rewrite an
/// entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_seq: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of the stored entry.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> Message {
        let message = Message {
            id: format!("msg-{:06}", self.next_seq),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        };
        self.next_seq += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
