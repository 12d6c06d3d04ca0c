//! Conversation state management
//!
//! Owns the ordered section list on behalf of the transport layer: one
//! section per user turn, mutated only by appending streamed assistant
//! content or replacing a message's content in place, and dropped only
//! on a full reset.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::ErrorValue;
use crate::message::{ChatMessage, MessagePart};

/// Transport status of the conversation stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Done,
    Error,
}

impl ChatStatus {
    /// True while a turn is in flight and part lists may still grow.
    pub fn is_loading(self) -> bool {
        matches!(self, ChatStatus::Submitted | ChatStatus::Streaming)
    }
}

/// One user turn plus the assistant messages answering it.
///
/// Identity for a given snapshot is the `(id, index)` pair; the index
/// comes from the section's position in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSection {
    pub id: String,
    pub user_message: ChatMessage,
    pub assistant_messages: Vec<ChatMessage>,
}

impl ChatSection {
    pub fn new(user_message: ChatMessage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_message,
            assistant_messages: vec![],
        }
    }

    pub fn push_assistant(&mut self, message: ChatMessage) {
        self.assistant_messages.push(message);
    }

    /// User message first, then assistant replies in arrival order.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        std::iter::once(&self.user_message).chain(self.assistant_messages.iter())
    }
}

/// Error type for conversation operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Tool call not found: {0}")]
    ToolCallNotFound(String),

    #[error("No turn in progress")]
    NoActiveTurn,
}

/// A full conversation: ordered sections plus the stream status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    sections: Vec<ChatSection>,
    status: ChatStatus,
    #[serde(skip)]
    error: Option<ErrorValue>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[ChatSection] {
        &self.sections
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ErrorValue> {
        self.error.as_ref()
    }

    /// Start a new user turn. Returns the new section's ID.
    pub fn begin_turn(&mut self, user_text: impl Into<String>) -> String {
        let section = ChatSection::new(ChatMessage::user(user_text));
        let id = section.id.clone();
        self.sections.push(section);
        self.status = ChatStatus::Submitted;
        self.error = None;
        debug!(section = %id, "started user turn");
        id
    }

    /// Append a streaming assistant reply to the current turn. Returns
    /// the new message's ID.
    pub fn begin_assistant_message(&mut self) -> Result<String, ConversationError> {
        let section = self
            .sections
            .last_mut()
            .ok_or(ConversationError::NoActiveTurn)?;
        let message = ChatMessage::assistant();
        let id = message.id.clone();
        section.push_assistant(message);
        self.status = ChatStatus::Streaming;
        Ok(id)
    }

    /// Append a part to the assistant message currently streaming.
    pub fn push_part(&mut self, part: MessagePart) -> Result<(), ConversationError> {
        self.current_assistant_mut()?.push_part(part);
        Ok(())
    }

    /// Append streamed text to the assistant message currently streaming.
    pub fn append_text(&mut self, text: &str) -> Result<(), ConversationError> {
        self.current_assistant_mut()?.append_text(text);
        Ok(())
    }

    /// Close out the in-flight turn.
    pub fn finish_turn(&mut self) {
        self.status = ChatStatus::Done;
    }

    /// Record a transport error and stop the turn.
    pub fn fail_turn(&mut self, error: ErrorValue) {
        self.status = ChatStatus::Error;
        self.error = Some(error);
    }

    /// Replace a message's content in place (edit/regenerate). The
    /// message keeps its ID; its parts collapse to a single text part.
    pub fn update_message(&mut self, message_id: &str, new_text: &str) -> Result<(), ConversationError> {
        let message = self
            .message_mut(message_id)
            .ok_or_else(|| ConversationError::MessageNotFound(message_id.to_string()))?;
        message.parts = vec![MessagePart::text(new_text)];
        Ok(())
    }

    /// Attach a tool result payload to the matching tool part.
    pub fn add_tool_result(
        &mut self,
        tool_call_id: &str,
        result: serde_json::Value,
    ) -> Result<(), ConversationError> {
        for section in self.sections.iter_mut().rev() {
            for message in section.assistant_messages.iter_mut().rev() {
                if let Some(part) = message.tool_part_mut(tool_call_id) {
                    part.result = Some(result);
                    return Ok(());
                }
            }
        }
        Err(ConversationError::ToolCallNotFound(tool_call_id.to_string()))
    }

    /// Drop every section and return to idle.
    pub fn reset(&mut self) {
        self.sections.clear();
        self.status = ChatStatus::Idle;
        self.error = None;
    }

    fn current_assistant_mut(&mut self) -> Result<&mut ChatMessage, ConversationError> {
        self.sections
            .last_mut()
            .and_then(|s| s.assistant_messages.last_mut())
            .ok_or(ConversationError::NoActiveTurn)
    }

    fn message_mut(&mut self, message_id: &str) -> Option<&mut ChatMessage> {
        for section in &mut self.sections {
            if section.user_message.id == message_id {
                return Some(&mut section.user_message);
            }
            for message in &mut section.assistant_messages {
                if message.id == message_id {
                    return Some(message);
                }
            }
        }
        None
    }
}
