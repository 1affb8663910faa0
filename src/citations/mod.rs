//! Citation extraction and rendering for AI-generated summaries.
//!
//! Summaries produced by the backend cite papers in three loosely structured ways:
//!
//! 1. A bold block, one citation per line:
//!    ```text
//!    **Citations**
//!    [0] 2502.05707
//!    [1] 2501.09123
//!    ```
//! 2. A single inline list: `Citations [0] 2502.05707 [1] 2501.09123`
//! 3. Bare markers in the prose: `... as shown in [2501.15687].`
//!
//! [`extract_citations`] turns any of these into an ordered, de-duplicated list of
//! [`CitationReference`](crate::models::CitationReference)s. [`render_summary`]
//! additionally splits the text into prose segments and in-place citation links, with
//! the structured blocks moved out of the prose and into the reference list.
//!
//! ```rust
//! use paper_scout::citations::extract_citations;
//!
//! let refs = extract_citations("Citations [0] 2502.05707 [1] 2501.09123");
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[1].id, "2501.09123");
//! ```

mod extract;
mod render;

pub use extract::{extract_citations, CitationParseError};
pub use render::{link_numbered_markers, render_summary, RenderedSummary, Segment};

/// Site-relative path of a paper's detail page
pub fn paper_path(id: &str) -> String {
    format!("/paper/{}", id)
}
