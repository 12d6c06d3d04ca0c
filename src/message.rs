//! Chat message types and operations
//!
//! Defines the message and part structures the rendering state engine
//! walks. Every part carries a kind tag; four of the kinds form a closed
//! set of tool invocations that drive disclosure defaults and counting.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Kind tag of a message part.
///
/// The transport sends free-form string tags; known tags map to
/// dedicated variants and anything else lands in [`PartKind::Other`].
/// [`PartKind::is_tool`] is true only for the closed set of specific
/// tool kinds (search, fetch, ask-question, related-questions); the
/// generic `tool-invocation` marker is not a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartKind {
    /// Plain text/markdown content.
    Text,
    /// Model reasoning/chain-of-thought block.
    Reasoning,
    /// Generic tool invocation marker.
    ToolInvocation,
    /// Web search tool call.
    Search,
    /// URL fetch tool call.
    Fetch,
    /// Clarifying question tool call.
    AskQuestion,
    /// Related questions tool call.
    RelatedQuestions,
    /// Any tag this crate does not know about.
    Other(String),
}

impl PartKind {
    /// Parse a transport tag into a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" => PartKind::Text,
            "reasoning" => PartKind::Reasoning,
            "tool-invocation" => PartKind::ToolInvocation,
            "tool-search" => PartKind::Search,
            "tool-fetch" => PartKind::Fetch,
            "tool-ask-question" => PartKind::AskQuestion,
            "tool-related-questions" => PartKind::RelatedQuestions,
            other => PartKind::Other(other.to_string()),
        }
    }

    /// The wire tag for this kind.
    pub fn tag(&self) -> &str {
        match self {
            PartKind::Text => "text",
            PartKind::Reasoning => "reasoning",
            PartKind::ToolInvocation => "tool-invocation",
            PartKind::Search => "tool-search",
            PartKind::Fetch => "tool-fetch",
            PartKind::AskQuestion => "tool-ask-question",
            PartKind::RelatedQuestions => "tool-related-questions",
            PartKind::Other(tag) => tag,
        }
    }

    /// True for the closed set of specific tool kinds.
    pub fn is_tool(&self) -> bool {
        matches!(
            self,
            PartKind::Search | PartKind::Fetch | PartKind::AskQuestion | PartKind::RelatedQuestions
        )
    }
}

impl From<String> for PartKind {
    fn from(tag: String) -> Self {
        PartKind::from_tag(&tag)
    }
}

impl From<PartKind> for String {
    fn from(kind: PartKind) -> Self {
        kind.tag().to_string()
    }
}

/// One typed fragment of a message's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    /// Unique ID for this part.
    pub id: String,
    /// Kind tag.
    pub kind: PartKind,
    /// Text content for text/reasoning parts, serialized arguments for
    /// tool parts.
    pub content: String,
    /// Tool call ID, present on tool parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool result payload once the transport delivers one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl MessagePart {
    pub fn new(kind: PartKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            tool_call_id: None,
            result: None,
        }
    }

    /// Plain text part.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(PartKind::Text, content)
    }

    /// Reasoning part.
    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::new(PartKind::Reasoning, content)
    }

    /// Tool part with its transport-assigned call ID.
    pub fn tool(kind: PartKind, tool_call_id: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: arguments.into(),
            tool_call_id: Some(tool_call_id.into()),
            result: None,
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    /// Ordered content parts, growing while the message streams.
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            parts: vec![MessagePart::text(content)],
        }
    }

    pub fn assistant() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            parts: vec![],
        }
    }

    pub fn push_part(&mut self, part: MessagePart) {
        self.parts.push(part);
    }

    /// Append streamed text to the trailing text part, or open a new one
    /// when the message ends in a non-text part.
    pub fn append_text(&mut self, text: &str) {
        if let Some(part) = self.parts.last_mut() {
            if part.kind == PartKind::Text {
                part.content.push_str(text);
                return;
            }
        }
        self.parts.push(MessagePart::text(text));
    }

    /// Whether the part at `index` has a successor in this message.
    pub fn has_next_part(&self, index: usize) -> bool {
        index + 1 < self.parts.len()
    }

    pub fn part_by_id(&self, part_id: &str) -> Option<&MessagePart> {
        self.parts.iter().find(|p| p.id == part_id)
    }

    /// Find a tool part by its transport-assigned call ID.
    pub fn tool_part_mut(&mut self, tool_call_id: &str) -> Option<&mut MessagePart> {
        self.parts
            .iter_mut()
            .find(|p| p.tool_call_id.as_deref() == Some(tool_call_id))
    }

    /// Flattened view of the message's text content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if part.kind == PartKind::Text {
                out.push_str(&part.content);
            }
        }
        out
    }
}
