//! Citation reference aggregation.
//!
//! Messages cite sources with inline numeric markers. Extraction is
//! injected per message via [`CitationExtractor`]; this module merges
//! the per-message maps into one conversation-wide lookup so a marker
//! anywhere in the view resolves by index.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conversation::ChatSection;
use crate::message::{ChatMessage, PartKind};

/// Target of one numeric citation marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRef {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CitationRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn with_title(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
        }
    }
}

/// Citation index → reference lookup. Indices are 1-based, as embedded
/// in message text.
pub type CitationMap = BTreeMap<u32, CitationRef>;

/// Per-message citation extraction, injected by the embedder.
pub trait CitationExtractor {
    fn extract(&self, message: &ChatMessage) -> CitationMap;
}

/// Merge per-message citation maps across `sections` in traversal order
/// (user message first, then assistant replies, section by section).
///
/// Duplicate indices resolve last-write-wins: a later message may
/// re-cite an index with refreshed reference data. Recomputed whole per
/// render pass; conversations are short enough that a full rescan is
/// cheaper than incremental patching.
pub fn aggregate_citations<E>(sections: &[ChatSection], extractor: &E) -> CitationMap
where
    E: CitationExtractor + ?Sized,
{
    let mut merged = CitationMap::new();
    for section in sections {
        for message in section.messages() {
            merged.extend(extractor.extract(message));
        }
    }
    trace!(citations = merged.len(), "aggregated citation maps");
    merged
}

/// `[N](url)` with numeric N
static CITATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)\]\((\S+?)\)").expect("valid regex"));

/// Default extractor: scans a message's text parts for numeric markdown
/// reference links such as `[3](https://example.com/doc)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCitationExtractor;

impl CitationExtractor for InlineCitationExtractor {
    fn extract(&self, message: &ChatMessage) -> CitationMap {
        let mut map = CitationMap::new();
        for part in &message.parts {
            if part.kind != PartKind::Text {
                continue;
            }
            for caps in CITATION_MARKER.captures_iter(&part.content) {
                let Ok(index) = caps[1].parse::<u32>() else {
                    continue;
                };
                if index == 0 {
                    continue;
                }
                map.insert(index, CitationRef::new(&caps[2]));
            }
        }
        map
    }
}
