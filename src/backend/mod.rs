//! Client for the external search-and-AI backend.
//!
//! This module defines the [`SearchBackend`] trait that every backend implementation
//! provides. The production implementation is [`HttpBackend`], which talks JSON over
//! HTTP to the search engine service; [`MockBackend`] returns scripted responses and is
//! used by tests and offline demos.
//!
//! # Retry policy
//!
//! Every operation is a single attempt. Callers decide whether and when to retry; the
//! query summary retry loop lives in [`crate::overview`].
//!
//! # Non-critical reads
//!
//! [`SearchBackend::get_categories`] and [`SearchBackend::get_autocomplete`] never
//! fail. Categories degrade to an empty list (see [`categories_or_default`] for the
//! static fallback) and autocomplete degrades to [`placeholder_suggestions`].

mod client;
pub mod mock;

pub use client::HttpBackend;
pub use mock::MockBackend;

use crate::models::{InsightsResponse, PaperRecord, SearchQuery, SearchResponse, SummaryResponse};
use async_trait::async_trait;
use http::StatusCode;

/// Categories shown when the backend cannot provide its own list
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "cs.AI", "cs.CV", "cs.LG", "cs.CL", "cs.NE", "cs.IR", "cs.HC", "cs.SE",
];

/// The SearchBackend trait defines the interface to the search/AI service.
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Hybrid semantic/full-text search
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError>;

    /// Generate an AI overview for a query
    async fn summarize_query(&self, query: &str) -> Result<SummaryResponse, BackendError>;

    /// List available categories; failures yield an empty list
    async fn get_categories(&self) -> Vec<String>;

    /// Query completions for a prefix; failures yield placeholder suggestions
    async fn get_autocomplete(&self, prefix: &str, limit: usize) -> Vec<String>;

    /// Fetch a single paper
    async fn get_paper_by_id(&self, id: &str) -> Result<PaperRecord, BackendError>;

    /// Generate AI insights for a paper
    async fn generate_insights(&self, paper_id: &str) -> Result<InsightsResponse, BackendError>;

    /// Papers by a specific author
    async fn search_by_author(
        &self,
        _author: &str,
        _limit: usize,
        _offset: usize,
    ) -> Result<SearchResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }

    /// Papers matching a DOI
    async fn search_by_doi(&self, _doi: &str) -> Result<SearchResponse, BackendError> {
        Err(BackendError::NotImplemented)
    }
}

/// Errors that can occur when talking to the backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The requested operation is not supported by this backend
    #[error("Operation not implemented for this backend")]
    NotImplemented,

    /// Connection, DNS, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("API error: {status}")]
    Http {
        /// Status code returned by the backend
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Paper not found
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// HTTP status associated with this error, if the backend produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Parse(format!("JSON: {}", err))
    }
}

/// Return `categories`, or [`DEFAULT_CATEGORIES`] when the backend gave none
pub fn categories_or_default(categories: Vec<String>) -> Vec<String> {
    if categories.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    } else {
        categories
    }
}

/// Suggestions synthesized from the prefix when autocomplete is unavailable
pub fn placeholder_suggestions(prefix: &str, limit: usize) -> Vec<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Vec::new();
    }

    [
        prefix.to_string(),
        format!("{} survey", prefix),
        format!("{} applications", prefix),
        format!("{} methods", prefix),
        format!("{} benchmarks", prefix),
    ]
    .into_iter()
    .take(limit)
    .collect()
}
