//! Search request and response models.

use serde::{Deserialize, Serialize};

use super::PaperRecord;

/// Search query parameters, serialised as the backend's request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Weight of the semantic (vector) score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_weight: Option<f64>,

    /// Weight of the full-text score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_weight: Option<f64>,

    /// Author filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Category filter (e.g. "cs.LG")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Year filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Maximum number of results to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Result offset for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            semantic_weight: None,
            text_weight: None,
            author: None,
            category: None,
            year: None,
            limit: None,
            offset: None,
        }
    }

    /// Set the semantic and full-text weights
    pub fn weights(mut self, semantic: f64, text: f64) -> Self {
        self.semantic_weight = Some(semantic);
        self.text_weight = Some(text);
        self
    }

    /// Set maximum results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set result offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set author filter
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set category filter
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set year filter
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }
}

/// Response from a search, author or DOI lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching papers
    #[serde(default)]
    pub results: Vec<PaperRecord>,

    /// Total number of matches (may exceed `results.len()`)
    #[serde(default)]
    pub total: usize,

    /// The query as interpreted by the backend
    #[serde(default)]
    pub query: String,
}

impl SearchResponse {
    /// Create a new response; `total` defaults to the number of results
    pub fn new(results: Vec<PaperRecord>, query: impl Into<String>) -> Self {
        let total = results.len();
        Self {
            results,
            total,
            query: query.into(),
        }
    }

    /// Whether the response holds no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// AI-generated overview of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// Summary text, possibly containing citation markers
    pub summary: String,
}

/// AI-generated insights for a single paper
///
/// Serialised in the backend's camelCase wire shape; snake_case keys are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    /// Paper the insights belong to
    #[serde(alias = "paper_id")]
    pub paper_id: String,

    /// Insight text (loosely formatted markdown)
    pub insights: String,

    /// Generation timestamp as sent by the backend
    #[serde(default, alias = "generated_at")]
    pub generated_at: String,
}
