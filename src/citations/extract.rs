//! Citation pattern matching.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

use crate::models::CitationReference;

/// A citation entry that could not be parsed. Never fatal: the entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CitationParseError {
    /// The `[index]` part is not a non-negative integer
    #[error("Invalid citation index '{index}' for paper {paper_id}")]
    InvalidIndex {
        /// Raw index text
        index: String,
        /// Paper identifier on the same entry
        paper_id: String,
    },
}

/// Result of scanning a summary: references plus the byte ranges of structured blocks
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub references: Vec<CitationReference>,
    pub blocks: Vec<Range<usize>>,
}

struct Patterns {
    /// `**Citations**` on a line of its own
    bold_marker: Regex,
    /// `[index] paperId` as a whole line, optionally bulleted
    block_entry: Regex,
    /// `Citations [0] id [1] id ...` as a whole line, trailing punctuation allowed
    inline_list: Regex,
    /// One `[index] paperId` pair
    inline_pair: Regex,
    /// `[paperId]`
    bare: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            bold_marker: Regex::new(r"(?m)^[ \t]*\*\*Citations:?\*\*:?[ \t\r]*$")?,
            block_entry: Regex::new(r"^[ \t]*(?:[-*][ \t]+)?\[([^\]\n]*)\][ \t]*(\d+\.\d+)[ \t]*$")?,
            inline_list: Regex::new(
                r"(?m)^[ \t]*(?:\*\*)?Citations:?(?:\*\*)?:?[ \t]*((?:\[[^\]\n]*\][ \t]*\d+\.\d+[ \t,;.]*)+)\r?$",
            )?,
            inline_pair: Regex::new(r"\[([^\]\n]*)\][ \t]*(\d+\.\d+)")?,
            bare: Regex::new(r"\[(\d+\.\d+)\]")?,
        })
    }
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| match Patterns::compile() {
            Ok(patterns) => Some(patterns),
            Err(e) => {
                tracing::error!("Citation patterns failed to compile: {}", e);
                None
            }
        })
        .as_ref()
}

/// Extract the papers cited by a summary, in first-seen order.
///
/// Structured blocks (`**Citations**` followed by `[index] id` lines, or a single
/// `Citations [index] id ...` line) keep the index written in the text. Bare `[id]`
/// markers are always scanned as well and receive the next free position in the list.
/// A paper already in the list is never added twice.
///
/// `None` and empty text give an empty list.
pub fn extract_citations<'a>(text: impl Into<Option<&'a str>>) -> Vec<CitationReference> {
    match text.into() {
        Some(text) => scan(text).references,
        None => Vec::new(),
    }
}

pub(crate) fn scan(text: &str) -> Scan {
    let mut result = Scan::default();
    if text.is_empty() {
        return result;
    }
    let Some(patterns) = patterns() else {
        return result;
    };

    scan_bold_blocks(text, patterns, &mut result);

    if result.blocks.is_empty() {
        scan_inline_lists(text, patterns, &mut result);
    }

    for caps in patterns.bare.captures_iter(text) {
        let index = result.references.len() as u32;
        push_unique(&mut result.references, &caps[1], index);
    }

    tracing::debug!(
        "Extracted {} citations ({} structured blocks)",
        result.references.len(),
        result.blocks.len()
    );

    result
}

fn scan_bold_blocks(text: &str, patterns: &Patterns, result: &mut Scan) {
    for marker in patterns.bold_marker.find_iter(text) {
        let mut cursor = marker.end();
        if text[cursor..].starts_with('\n') {
            cursor += 1;
        }

        let mut end = None;
        for raw in text[cursor..].split_inclusive('\n') {
            let line = raw.trim_end_matches(['\n', '\r']);

            if line.trim().is_empty() {
                if end.is_none() {
                    cursor += raw.len();
                    continue;
                }
                break;
            }

            let Some(caps) = patterns.block_entry.captures(line) else {
                break;
            };

            cursor += raw.len();
            end = Some(cursor);
            record_entry(&caps, &mut result.references);
        }

        if let Some(end) = end {
            result.blocks.push(marker.start()..end);
        }
    }
}

fn scan_inline_lists(text: &str, patterns: &Patterns, result: &mut Scan) {
    for caps in patterns.inline_list.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        for pair in patterns.inline_pair.captures_iter(&caps[1]) {
            record_entry(&pair, &mut result.references);
        }

        let mut end = whole.end();
        if text[end..].starts_with('\n') {
            end += 1;
        }
        result.blocks.push(whole.start()..end);
    }
}

/// Record an `[index] id` capture, skipping entries whose index does not parse
fn record_entry(caps: &Captures<'_>, references: &mut Vec<CitationReference>) {
    match parse_entry(&caps[1], &caps[2]) {
        Ok((id, index)) => push_unique(references, id, index),
        Err(e) => tracing::debug!("Skipping citation entry: {}", e),
    }
}

fn parse_entry<'t>(index: &str, paper_id: &'t str) -> Result<(&'t str, u32), CitationParseError> {
    let index = index.trim();
    index
        .parse::<u32>()
        .map(|i| (paper_id, i))
        .map_err(|_| CitationParseError::InvalidIndex {
            index: index.to_string(),
            paper_id: paper_id.to_string(),
        })
}

fn push_unique(references: &mut Vec<CitationReference>, id: &str, index: u32) {
    if !references.iter().any(|r| r.id == id) {
        references.push(CitationReference::new(id, index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(refs: &[CitationReference]) -> Vec<(&str, u32)> {
        refs.iter().map(|r| (r.id.as_str(), r.index)).collect()
    }

    #[test]
    fn test_no_markers() {
        assert!(extract_citations("Plain prose about transformers.").is_empty());
        assert!(extract_citations("").is_empty());
        assert!(extract_citations(None).is_empty());
    }

    #[test]
    fn test_bold_block() {
        let refs = extract_citations("**Citations**\n[0] 2502.05707\n[1] 2501.09123");
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2501.09123", 1)]);
    }

    #[test]
    fn test_inline_list() {
        let refs = extract_citations("Citations [0] 2502.05707 [1] 2501.09123");
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2501.09123", 1)]);
    }

    #[test]
    fn test_bare_marker() {
        let refs = extract_citations("Diffusion models scale well [2501.15687].");
        assert_eq!(ids(&refs), vec![("2501.15687", 0)]);
    }

    #[test]
    fn test_bold_block_keeps_written_index() {
        let text = "Summary.\n\n**Citations:**\n[3] 2502.05707\n[7] 2501.09123\n";
        let refs = extract_citations(text);
        assert_eq!(ids(&refs), vec![("2502.05707", 3), ("2501.09123", 7)]);
    }

    #[test]
    fn test_bold_block_skips_blank_lines_after_marker() {
        let text = "**Citations**\n\n[0] 2502.05707\n\nUnrelated closing line [9]";
        let scan = scan(text);
        assert_eq!(ids(&scan.references), vec![("2502.05707", 0)]);
        assert_eq!(&text[scan.blocks[0].clone()], "**Citations**\n\n[0] 2502.05707\n");
    }

    #[test]
    fn test_block_ends_at_first_non_entry_line() {
        let text = "**Citations**\n[0] 2502.05707\nSee also the appendix.\n[1] 2501.09123";
        let refs = extract_citations(text);
        // the trailing line is outside the block and is not a bare marker either
        assert_eq!(ids(&refs), vec![("2502.05707", 0)]);
    }

    #[test]
    fn test_malformed_index_is_skipped() {
        let refs = extract_citations("**Citations**\n[a] 2502.05707\n[1] 2501.09123");
        assert_eq!(ids(&refs), vec![("2501.09123", 1)]);

        let refs = extract_citations("Citations [x] 2502.05707 [1] 2501.09123");
        assert_eq!(ids(&refs), vec![("2501.09123", 1)]);
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let text = "Results in [2501.09123] and [2502.05707].\n\n**Citations**\n[0] 2502.05707\n[1] 2501.09123";
        let refs = extract_citations(text);
        // structured block runs first, bare markers only add new ids
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2501.09123", 1)]);

        let refs = extract_citations("[2502.05707] then again [2502.05707]");
        assert_eq!(ids(&refs), vec![("2502.05707", 0)]);
    }

    #[test]
    fn test_bare_markers_supplement_block() {
        let text = "See [2503.08420].\n**Citations**\n[0] 2502.05707";
        let refs = extract_citations(text);
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2503.08420", 1)]);
    }

    #[test]
    fn test_inline_list_skipped_when_bold_block_present() {
        let text = "**Citations**\n[0] 2502.05707\nCitations [5] 2401.00001";
        let scan = scan(text);
        assert_eq!(ids(&scan.references), vec![("2502.05707", 0)]);
        assert_eq!(scan.blocks.len(), 1);
    }

    #[test]
    fn test_inline_list_in_prose_is_not_a_block() {
        let refs = extract_citations("Citations [0] 2502.05707 show strong gains overall.");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let refs = extract_citations("**Citations**\r\n[0] 2502.05707\r\n[1] 2501.09123\r\n");
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2501.09123", 1)]);
    }

    #[test]
    fn test_inline_list_trailing_period() {
        let refs = extract_citations("Citations: [0] 2502.05707, [1] 2501.09123.");
        assert_eq!(ids(&refs), vec![("2502.05707", 0), ("2501.09123", 1)]);
    }

    #[test]
    fn test_bulleted_block_entries() {
        let text = "**Citations**\n- [0] 2502.05707\n* [1] 2501.09123\n";
        let scan = scan(text);
        assert_eq!(ids(&scan.references), vec![("2502.05707", 0), ("2501.09123", 1)]);
        assert_eq!(&text[scan.blocks[0].clone()], text);
    }

    #[test]
    fn test_numeric_marker_is_not_a_paper() {
        assert!(extract_citations("As shown in [1] and [2].").is_empty());
    }
}
