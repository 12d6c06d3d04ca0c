//! Section composition.
//!
//! [`SectionComposer`] is the orchestrator of the rendering state
//! engine: it walks the ordered sections, hands every message to the
//! injected renderer together with its disclosure capabilities, and
//! appends the loading/error affordances after the trailing section.
//! It owns the disclosure map and the tool count cache for one live
//! conversation view; all mutation is event-serialized by the caller.

use tracing::debug;

use crate::citation::{aggregate_citations, CitationExtractor, CitationMap};
use crate::conversation::{ChatSection, ChatStatus};
use crate::disclosure::{DisclosureId, DisclosureMap, PartContext};
use crate::error::{normalize_error, ErrorValue};
use crate::message::ChatMessage;
use crate::toolcount::ToolCountCache;

/// Session actions a renderer may forward back to the transport.
///
/// Every method defaults to a no-op so embedders implement only what
/// their transport supports.
pub trait SessionHooks {
    /// A suggested or related query was selected.
    fn select_query(&mut self, _query: &str) {}

    /// Replace a message's content (user edit).
    fn update_message(&mut self, _message_id: &str, _new_content: &str) {}

    /// Regenerate the reply to a message.
    fn reload(&mut self, _message_id: &str) {}

    /// Deliver a tool result produced by the UI.
    fn add_tool_result(&mut self, _tool_call_id: &str, _result: serde_json::Value) {}
}

/// Hooks implementation that ignores every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}

/// Everything the composer reads for one pass. The transport owns all
/// three fields; the composer never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub sections: &'a [ChatSection],
    pub status: ChatStatus,
    pub error: Option<&'a ErrorValue>,
}

/// One message as handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a ChatMessage,
    /// ID of the owning section.
    pub section_id: &'a str,
    /// Position of the owning section in the conversation; `(section_id,
    /// section_index)` is the stable identity for this snapshot.
    pub section_index: usize,
    /// True only for the last assistant message of the last section,
    /// which renderers use to enable regenerate affordances.
    pub is_latest_message: bool,
}

/// Capabilities handed to the renderer alongside each message:
/// disclosure lookup bound to that message, the toggle mutator, the
/// aggregated citation map, and the session hooks.
pub struct RenderCapabilities<'a> {
    message: &'a ChatMessage,
    disclosure: &'a mut DisclosureMap,
    counts: &'a mut ToolCountCache,
    citations: &'a CitationMap,
    hooks: &'a mut dyn SessionHooks,
    is_loading: bool,
}

impl RenderCapabilities<'_> {
    /// Open state for a message-level element with no part context.
    pub fn is_open(&mut self, id: &DisclosureId) -> bool {
        self.disclosure.is_open(id, None, self.counts)
    }

    /// Open state for the part at `index` of the current message. The
    /// part's kind and successor relation come from the message itself.
    pub fn is_part_open(&mut self, id: &DisclosureId, index: usize) -> bool {
        let Some(part) = self.message.parts.get(index) else {
            return self.disclosure.is_open(id, None, self.counts);
        };
        let ctx = PartContext {
            kind: &part.kind,
            has_next_part: self.message.has_next_part(index),
            message: self.message,
            is_loading: self.is_loading,
        };
        self.disclosure.is_open(id, Some(ctx), self.counts)
    }

    /// Record an explicit user toggle for `id`.
    pub fn set_open(&mut self, id: DisclosureId, open: bool) {
        self.disclosure.set_open(id, open);
    }

    /// Conversation-wide citation lookup.
    pub fn citations(&self) -> &CitationMap {
        self.citations
    }

    /// Session actions for pass-through wiring.
    pub fn hooks(&mut self) -> &mut dyn SessionHooks {
        self.hooks
    }
}

/// One entry in the composed output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem<T> {
    /// Rendered message output.
    Message(T),
    /// Activity indicator trailing the last section while a turn is in
    /// flight.
    Loading,
    /// Normalized error display trailing the last section.
    Error(String),
}

/// Turns one message into render output.
pub trait MessageRenderer {
    type Output;

    fn render_message(
        &mut self,
        view: MessageView<'_>,
        caps: &mut RenderCapabilities<'_>,
    ) -> Self::Output;
}

/// Rendering state for one live conversation view.
#[derive(Debug, Default)]
pub struct SectionComposer {
    disclosure: DisclosureMap,
    tool_counts: ToolCountCache,
    was_loading: bool,
}

impl SectionComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The disclosure map, for inspecting stored toggles.
    pub fn disclosure(&self) -> &DisclosureMap {
        &self.disclosure
    }

    /// Record an explicit user toggle outside a render pass.
    pub fn set_open(&mut self, id: DisclosureId, open: bool) {
        self.disclosure.set_open(id, open);
    }

    /// Drop all per-conversation state (toggles and cached counts).
    /// Call when the conversation resets.
    pub fn reset(&mut self) {
        self.disclosure.clear();
        self.tool_counts.invalidate();
        self.was_loading = false;
    }

    /// Compose one render pass: every section's messages in order, then
    /// the trailing loading/error affordances. Returns nothing for an
    /// empty conversation.
    pub fn compose<R, E>(
        &mut self,
        request: ComposeRequest<'_>,
        renderer: &mut R,
        extractor: &E,
        hooks: &mut dyn SessionHooks,
    ) -> Vec<RenderItem<R::Output>>
    where
        R: MessageRenderer,
        E: CitationExtractor + ?Sized,
    {
        let is_loading = request.status.is_loading();

        // Must run before any count read in this pass: a new turn means
        // previously finalized messages may start mutating again.
        if is_loading && !self.was_loading {
            self.tool_counts.invalidate();
        }
        self.was_loading = is_loading;

        if request.sections.is_empty() {
            return Vec::new();
        }

        let citations = aggregate_citations(request.sections, extractor);
        debug!(
            sections = request.sections.len(),
            is_loading, "composing sections"
        );

        let mut items = Vec::new();
        let last_section = request.sections.len() - 1;

        for (section_index, section) in request.sections.iter().enumerate() {
            let output = self.render_one(
                renderer,
                &section.user_message,
                section,
                section_index,
                false,
                is_loading,
                &citations,
                hooks,
            );
            items.push(RenderItem::Message(output));

            for (message_index, message) in section.assistant_messages.iter().enumerate() {
                let is_latest = section_index == last_section
                    && message_index + 1 == section.assistant_messages.len();
                let output = self.render_one(
                    renderer,
                    message,
                    section,
                    section_index,
                    is_latest,
                    is_loading,
                    &citations,
                    hooks,
                );
                items.push(RenderItem::Message(output));
            }
        }

        if is_loading {
            items.push(RenderItem::Loading);
        }
        if let Some(message) = normalize_error(request.error) {
            items.push(RenderItem::Error(message));
        }

        items
    }

    #[allow(clippy::too_many_arguments)]
    fn render_one<R: MessageRenderer>(
        &mut self,
        renderer: &mut R,
        message: &ChatMessage,
        section: &ChatSection,
        section_index: usize,
        is_latest_message: bool,
        is_loading: bool,
        citations: &CitationMap,
        hooks: &mut dyn SessionHooks,
    ) -> R::Output {
        let view = MessageView {
            message,
            section_id: &section.id,
            section_index,
            is_latest_message,
        };
        let mut caps = RenderCapabilities {
            message,
            disclosure: &mut self.disclosure,
            counts: &mut self.tool_counts,
            citations,
            hooks,
            is_loading,
        };
        renderer.render_message(view, &mut caps)
    }
}
