//! Message and Transcript domain types.
//!
//! These are the core value objects that flow through the entire system:
//! User submits a prompt → Transcript records it → Provider sees the whole
//! Transcript → the reply is recorded → the host displays the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::TranscriptError;
use crate::token::TokenCounter;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standing instructions (persona, rules)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// The wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// An ordered conversation whose first entry is always the system message.
///
/// Invariants:
/// - index 0 holds the one and only [`Role::System`] message
/// - appends go to the end; eviction removes the oldest non-system entry
/// - messages are never edited once appended
///
/// The message list is private so the invariants cannot be broken from
/// outside; read access goes through [`messages`](Self::messages) and
/// [`history`](Self::history).
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a transcript holding only the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a user or assistant message at the end.
    ///
    /// Consecutive messages with the same role are allowed. System messages
    /// are rejected: the system entry is only ever replaced via [`reset`](Self::reset).
    pub fn append(&mut self, message: Message) -> Result<&Message, TranscriptError> {
        if message.role == Role::System {
            return Err(TranscriptError::SystemAppend);
        }
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.messages.push(Message::user(content));
        &self.messages[self.messages.len() - 1]
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.messages.push(Message::assistant(content));
        &self.messages[self.messages.len() - 1]
    }

    /// All messages, system entry first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The standing system message.
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// The current system prompt text.
    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    /// Every non-system message, oldest first. This is what a chat UI shows.
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Total number of messages, including the system entry.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A transcript always holds its system message, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether any user/assistant messages remain (i.e. eviction is possible).
    pub fn has_history(&self) -> bool {
        self.messages.len() > 1
    }

    /// Sum of token counts over every message, system entry included.
    pub fn total_tokens(&self, counter: &dyn TokenCounter, model: &str) -> usize {
        self.messages
            .iter()
            .map(|m| counter.count(model, &m.content))
            .sum()
    }

    /// Remove the oldest non-system message.
    ///
    /// Returns `None` ("nothing left to evict") when only the system entry
    /// remains.
    pub fn evict_oldest(&mut self) -> Option<Message> {
        if self.has_history() {
            Some(self.messages.remove(1))
        } else {
            None
        }
    }

    /// Drop all history and reinstall a single system message.
    ///
    /// Uses `new_system_prompt` when given, otherwise keeps the current one.
    pub fn reset(&mut self, new_system_prompt: Option<String>) {
        let prompt = new_system_prompt.unwrap_or_else(|| self.system_prompt().to_string());
        debug!(
            dropped = self.messages.len() - 1,
            "Resetting transcript"
        );
        self.messages.clear();
        self.messages.push(Message::system(prompt));
    }
}
