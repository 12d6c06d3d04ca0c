//! Collapsible element disclosure state.
//!
//! Each collapsible element in the rendered conversation is keyed by a
//! [`DisclosureId`]. Only explicit user toggles are stored; everything
//! else resolves to a computed default based on the part's kind, its
//! position, and the owning message's tool count.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, PartKind};
use crate::toolcount::ToolCountCache;

/// Key for one collapsible UI element.
///
/// Typed constructors keep message-level and part-level elements from
/// colliding on the same raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisclosureId {
    Message(String),
    Part(String),
}

impl DisclosureId {
    /// Key for a message-level element.
    pub fn message(id: impl Into<String>) -> Self {
        DisclosureId::Message(id.into())
    }

    /// Key for a part-level element.
    pub fn part(id: impl Into<String>) -> Self {
        DisclosureId::Part(id.into())
    }
}

impl fmt::Display for DisclosureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisclosureId::Message(id) => write!(f, "message:{id}"),
            DisclosureId::Part(id) => write!(f, "part:{id}"),
        }
    }
}

/// Context for computing a part's default disclosure.
#[derive(Debug, Clone, Copy)]
pub struct PartContext<'a> {
    /// The part's kind tag.
    pub kind: &'a PartKind,
    /// Whether a later part has already streamed in after this one.
    pub has_next_part: bool,
    /// The message owning the part.
    pub message: &'a ChatMessage,
    /// Whether the conversation is currently loading.
    pub is_loading: bool,
}

/// Explicit user open/close toggles, falling back to computed defaults.
#[derive(Debug, Default)]
pub struct DisclosureMap {
    overrides: HashMap<DisclosureId, bool>,
}

impl DisclosureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit user toggle. Wins over every default rule
    /// until the conversation resets.
    pub fn set_open(&mut self, id: DisclosureId, open: bool) {
        self.overrides.insert(id, open);
    }

    /// The stored toggle for `id`, if the user ever touched it.
    pub fn override_for(&self, id: &DisclosureId) -> Option<bool> {
        self.overrides.get(id).copied()
    }

    /// Resolve an element's open state. First match wins:
    ///
    /// 1. A stored user toggle for `id`.
    /// 2. Specific tool kinds: open iff the owning message holds at most
    ///    one tool invocation. A message with several tool panels starts
    ///    with all of them collapsed.
    /// 3. The generic `tool-invocation` marker: open.
    /// 4. Reasoning: open only while it is the last part so far; once a
    ///    later part streams in, the block auto-collapses.
    /// 5. Everything else: open.
    pub fn is_open(
        &self,
        id: &DisclosureId,
        part: Option<PartContext<'_>>,
        counts: &mut ToolCountCache,
    ) -> bool {
        if let Some(open) = self.override_for(id) {
            return open;
        }
        let Some(part) = part else {
            return true;
        };
        if part.kind.is_tool() {
            return counts.count(part.message, part.is_loading) <= 1;
        }
        match part.kind {
            PartKind::ToolInvocation => true,
            PartKind::Reasoning => !part.has_next_part,
            _ => true,
        }
    }

    /// Drop every stored toggle.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ChatMessage, MessagePart};

    fn message_with_tools(count: usize) -> ChatMessage {
        let mut msg = ChatMessage::assistant();
        for i in 0..count {
            msg.push_part(MessagePart::tool(PartKind::Search, format!("call-{i}"), "{}"));
        }
        msg
    }

    fn part_ctx<'a>(
        msg: &'a ChatMessage,
        kind: &'a PartKind,
        has_next_part: bool,
    ) -> PartContext<'a> {
        PartContext {
            kind,
            has_next_part,
            message: msg,
            is_loading: false,
        }
    }

    #[test]
    fn test_user_override_always_wins() {
        let mut map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        let msg = message_with_tools(1);
        let id = DisclosureId::part(msg.parts[0].id.clone());

        // Default for a single tool part would be open
        assert!(map.is_open(&id, Some(part_ctx(&msg, &PartKind::Search, false)), &mut counts));

        map.set_open(id.clone(), false);
        assert!(!map.is_open(&id, Some(part_ctx(&msg, &PartKind::Search, false)), &mut counts));

        // Toggling back is equally sticky
        map.set_open(id.clone(), true);
        assert!(map.is_open(&id, Some(part_ctx(&msg, &PartKind::Search, false)), &mut counts));
    }

    #[test]
    fn test_single_tool_part_defaults_open() {
        let map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        let msg = message_with_tools(1);
        let id = DisclosureId::part(msg.parts[0].id.clone());

        assert!(map.is_open(&id, Some(part_ctx(&msg, &PartKind::Search, false)), &mut counts));
    }

    #[test]
    fn test_two_tool_parts_default_closed() {
        let map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        let msg = message_with_tools(2);
        let id = DisclosureId::part(msg.parts[0].id.clone());

        assert!(!map.is_open(&id, Some(part_ctx(&msg, &PartKind::Search, true)), &mut counts));
    }

    #[test]
    fn test_generic_tool_invocation_defaults_open() {
        let map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        // Even inside a message crowded with tool panels
        let msg = message_with_tools(3);
        let id = DisclosureId::part("marker".to_string());

        assert!(map.is_open(
            &id,
            Some(part_ctx(&msg, &PartKind::ToolInvocation, true)),
            &mut counts
        ));
    }

    #[test]
    fn test_reasoning_collapses_once_followed() {
        let map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        let msg = ChatMessage::assistant();
        let id = DisclosureId::part("reasoning-part".to_string());

        assert!(map.is_open(&id, Some(part_ctx(&msg, &PartKind::Reasoning, false)), &mut counts));
        assert!(!map.is_open(&id, Some(part_ctx(&msg, &PartKind::Reasoning, true)), &mut counts));
    }

    #[test]
    fn test_everything_else_defaults_open() {
        let map = DisclosureMap::new();
        let mut counts = ToolCountCache::new();
        let msg = ChatMessage::assistant();
        let other = PartKind::Other("source-list".to_string());

        assert!(map.is_open(
            &DisclosureId::part("p"),
            Some(part_ctx(&msg, &PartKind::Text, true)),
            &mut counts
        ));
        assert!(map.is_open(
            &DisclosureId::part("q"),
            Some(part_ctx(&msg, &other, true)),
            &mut counts
        ));
        // No part context at all
        assert!(map.is_open(&DisclosureId::message("m"), None, &mut counts));
    }

    #[test]
    fn test_message_and_part_ids_do_not_collide() {
        let mut map = DisclosureMap::new();
        map.set_open(DisclosureId::message("abc"), false);

        assert_eq!(map.override_for(&DisclosureId::message("abc")), Some(false));
        assert_eq!(map.override_for(&DisclosureId::part("abc")), None);
    }

    #[test]
    fn test_clear_drops_overrides() {
        let mut map = DisclosureMap::new();
        map.set_open(DisclosureId::part("p"), false);
        assert_eq!(map.len(), 1);

        map.clear();
        assert!(map.is_empty());
    }
}
