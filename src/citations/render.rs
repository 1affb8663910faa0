//! Turn a summary into prose segments with citation links.

use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::OnceLock;

use super::extract::scan;
use super::paper_path;
use crate::models::CitationReference;
use crate::session::ReferencedPapers;

/// A piece of rendered summary text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Plain prose
    Text(String),
    /// An in-place citation linking to a paper
    Citation { label: String, paper_id: String },
}

/// A summary split into prose and citation segments, plus its reference list.
///
/// Structured citation blocks never appear in `segments`; the papers they list are
/// available only through `references`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedSummary {
    pub segments: Vec<Segment>,
    pub references: Vec<CitationReference>,
}

impl RenderedSummary {
    /// Whether the summary cites anything
    pub fn has_citations(&self) -> bool {
        !self.references.is_empty()
            || self
                .segments
                .iter()
                .any(|s| matches!(s, Segment::Citation { .. }))
    }

    /// Render as markdown with `/paper/{id}` links and a trailing reference list.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Citation { label, paper_id } => {
                    let _ = write!(out, "[[{}]]({})", label, paper_path(paper_id));
                }
            }
        }

        if !self.references.is_empty() {
            out.push_str("\n\n**References**\n");
            for reference in &self.references {
                let _ = writeln!(
                    out,
                    "- [{}] [{}]({})",
                    reference.index,
                    reference.id,
                    reference.path()
                );
            }
        }

        out
    }

    /// Render for a terminal: citations stay as `[label]`, references get their paths.
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Citation { label, .. } => {
                    let _ = write!(out, "[{}]", label);
                }
            }
        }

        if !self.references.is_empty() {
            out.push_str("\n\nReferences:\n");
            for reference in &self.references {
                let _ = writeln!(
                    out,
                    "  [{}] {}  {}",
                    reference.index,
                    reference.id,
                    reference.path()
                );
            }
        }

        out
    }
}

fn marker_pattern() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| match Regex::new(r"\[(\d+(?:\.\d+)?)\]") {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Citation marker pattern failed to compile: {}", e);
                None
            }
        })
        .as_ref()
}

/// Split a summary into segments and references.
///
/// `[paperId]` markers become citations in place. Numeric `[n]` markers become
/// citations only when `n` is the index of an extracted reference.
pub fn render_summary(text: &str) -> RenderedSummary {
    let scan = scan(text);

    let prose = if scan.blocks.is_empty() {
        text.to_string()
    } else {
        let mut prose = String::with_capacity(text.len());
        let mut last = 0;
        for block in &scan.blocks {
            if block.start >= last {
                prose.push_str(&text[last..block.start]);
                last = block.end;
            }
        }
        prose.push_str(&text[last..]);
        prose.trim_end().to_string()
    };

    let mut segments = Vec::new();
    let mut pending = String::new();

    match marker_pattern() {
        Some(marker) => {
            let mut last = 0;
            for caps in marker.captures_iter(&prose) {
                let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                pending.push_str(&prose[last..whole.start()]);
                last = whole.end();

                match resolve_marker(inner.as_str(), &scan.references) {
                    Some(paper_id) => {
                        if !pending.is_empty() {
                            segments.push(Segment::Text(std::mem::take(&mut pending)));
                        }
                        segments.push(Segment::Citation {
                            label: inner.as_str().to_string(),
                            paper_id,
                        });
                    }
                    None => pending.push_str(whole.as_str()),
                }
            }
            pending.push_str(&prose[last..]);
        }
        None => pending = prose,
    }

    if !pending.is_empty() {
        segments.push(Segment::Text(pending));
    }

    RenderedSummary {
        segments,
        references: scan.references,
    }
}

fn resolve_marker(marker: &str, references: &[CitationReference]) -> Option<String> {
    if marker.contains('.') {
        return Some(marker.to_string());
    }
    let index: u32 = marker.parse().ok()?;
    references
        .iter()
        .find(|r| r.index == index)
        .map(|r| r.id.clone())
}

/// Link chat-style `[n]` markers to the n-th referenced paper (1-based).
///
/// Markers without a matching paper are left as they are.
pub fn link_numbered_markers(text: &str, papers: &ReferencedPapers) -> String {
    static NUMBERED: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = NUMBERED.get_or_init(|| Regex::new(r"\[(\d+)\]").ok());
    let Some(pattern) = pattern else {
        return text.to_string();
    };

    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let linked = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| papers.get_numbered(n));
            match linked {
                Some(paper) => format!("[[{}]]({})", &caps[1], paper.path()),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
