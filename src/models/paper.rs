//! Paper record as returned by the search backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive metadata attached to a paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Authors, comma-separated ("Ada Lovelace, Alan Turing")
    #[serde(default)]
    pub authors: String,

    /// arXiv categories, space-separated ("cs.CV cs.LG")
    #[serde(default)]
    pub categories: String,

    /// Publication year
    #[serde(default)]
    pub year: String,

    /// Digital Object Identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Submitting author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,

    /// Any further fields the backend sends
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A research paper, either as a search hit or as a full detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper identifier (arXiv-style, e.g. `2503.08420`)
    pub id: String,

    /// Paper title
    pub title: String,

    /// Abstract / main text
    #[serde(default)]
    pub content: String,

    /// Relevance score from the search engine
    #[serde(default)]
    pub score: f64,

    /// Best-matching passage for the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,

    /// Paper metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaperMetadata>,

    /// Highlighted fragments keyed by field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HashMap<String, Vec<String>>>,
}

impl PaperRecord {
    /// Create a new record with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            score: 0.0,
            passage: None,
            metadata: None,
            highlights: None,
        }
    }

    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        self.metadata
            .as_ref()
            .map(|m| {
                m.authors
                    .split(", ")
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the categories as a vector
    pub fn category_list(&self) -> Vec<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.categories.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Publication year, if known
    pub fn year(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.year.trim())
            .filter(|y| !y.is_empty())
    }

    /// DOI, if known
    pub fn doi(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.doi.as_deref())
    }

    /// First `max_chars` characters of the content, with an ellipsis when cut
    pub fn excerpt(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            return self.content.clone();
        }
        let cut: String = self.content.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }

    /// Site-relative path of this paper's detail page
    pub fn path(&self) -> String {
        crate::citations::paper_path(&self.id)
    }
}

/// Builder for constructing PaperRecord objects
#[derive(Debug, Clone)]
pub struct PaperRecordBuilder {
    paper: PaperRecord,
}

impl PaperRecordBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper: PaperRecord::new(id, title),
        }
    }

    fn metadata(&mut self) -> &mut PaperMetadata {
        self.paper.metadata.get_or_insert_with(PaperMetadata::default)
    }

    /// Set content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.paper.content = content.into();
        self
    }

    /// Set relevance score
    pub fn score(mut self, score: f64) -> Self {
        self.paper.score = score;
        self
    }

    /// Set matching passage
    pub fn passage(mut self, passage: impl Into<String>) -> Self {
        self.paper.passage = Some(passage.into());
        self
    }

    /// Set authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.metadata().authors = authors.into();
        self
    }

    /// Set categories
    pub fn categories(mut self, categories: impl Into<String>) -> Self {
        self.metadata().categories = categories.into();
        self
    }

    /// Set year
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.metadata().year = year.into();
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.metadata().doi = Some(doi.into());
        self
    }

    /// Add a highlighted fragment for a field
    pub fn highlight(mut self, field: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.paper
            .highlights
            .get_or_insert_with(HashMap::new)
            .entry(field.into())
            .or_default()
            .push(fragment.into());
        self
    }

    /// Build the PaperRecord
    pub fn build(self) -> PaperRecord {
        self.paper
    }
}
