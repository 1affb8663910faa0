//! Citation references extracted from AI-generated summaries.

use serde::{Deserialize, Serialize};

/// A paper cited by a generated summary.
///
/// `index` is the zero-based position assigned when the paper was first seen. For
/// structured citation blocks it is the number written in the block; for bare inline
/// markers it is assigned sequentially.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationReference {
    /// Paper identifier (e.g. `2502.05707`)
    pub id: String,

    /// Citation index
    pub index: u32,
}

impl CitationReference {
    /// Create a new reference
    pub fn new(id: impl Into<String>, index: u32) -> Self {
        Self {
            id: id.into(),
            index,
        }
    }

    /// Site-relative path of the cited paper's detail page
    pub fn path(&self) -> String {
        crate::citations::paper_path(&self.id)
    }
}

impl std::fmt::Display for CitationReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.index, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_path() {
        let citation = CitationReference::new("2502.05707", 3);
        assert_eq!(citation.to_string(), "[3] 2502.05707");
        assert_eq!(citation.path(), "/paper/2502.05707");
    }
}
