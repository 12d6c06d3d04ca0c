//! Per-message tool invocation counting.
//!
//! Counting a finalized message is memoized by message ID. While a turn
//! is in flight the part list is still growing, so counts are taken
//! live and the cache is left untouched. The composer invalidates the
//! whole cache when a new turn starts streaming.

use std::collections::HashMap;

use tracing::debug;

use crate::message::ChatMessage;

/// Memoized tool-part counts, one instance per live conversation view.
#[derive(Debug, Default)]
pub struct ToolCountCache {
    counts: HashMap<String, usize>,
    scans: usize,
}

impl ToolCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tool-kind parts in `message`.
    ///
    /// While `is_loading` the count is scanned fresh on every call and
    /// never cached. A message with an empty ID always counts 0.
    pub fn count(&mut self, message: &ChatMessage, is_loading: bool) -> usize {
        if message.id.is_empty() {
            return 0;
        }
        if is_loading {
            return self.scan(message);
        }
        if let Some(&cached) = self.counts.get(&message.id) {
            return cached;
        }
        let count = self.scan(message);
        self.counts.insert(message.id.clone(), count);
        count
    }

    /// Drop every cached count. Called when a new turn begins, since
    /// finalized-count assumptions no longer hold for messages that may
    /// still mutate.
    pub fn invalidate(&mut self) {
        if !self.counts.is_empty() {
            debug!(entries = self.counts.len(), "invalidating tool count cache");
        }
        self.counts.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn scan(&mut self, message: &ChatMessage) -> usize {
        self.scans += 1;
        message.parts.iter().filter(|p| p.kind.is_tool()).count()
    }

    /// Total number of part-list scans performed. Diagnostic counter;
    /// a cache hit leaves it unchanged.
    pub fn scans(&self) -> usize {
        self.scans
    }
}
