//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{placeholder_suggestions, BackendError, SearchBackend};
use crate::models::{InsightsResponse, PaperRecord, SearchQuery, SearchResponse, SummaryResponse};

/// A mock backend that returns scripted responses and counts requests.
///
/// Summary outcomes are consumed in order; once the script is empty every further
/// summary request fails with a network error.
#[derive(Debug, Default)]
pub struct MockBackend {
    search_response: Mutex<Option<SearchResponse>>,
    summaries: Mutex<VecDeque<Result<String, BackendError>>>,
    summary_queries: Mutex<Vec<String>>,
    summary_calls: AtomicUsize,
    papers: Mutex<HashMap<String, PaperRecord>>,
    insights: Mutex<HashMap<String, Result<String, BackendError>>>,
    categories: Mutex<Option<Vec<String>>>,
    suggestions: Mutex<Option<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search response to return.
    pub fn set_search_response(&self, response: SearchResponse) {
        *self.search_response.lock().unwrap() = Some(response);
    }

    /// Queue a successful summary.
    pub fn push_summary(&self, summary: impl Into<String>) {
        self.summaries
            .lock()
            .unwrap()
            .push_back(Ok(summary.into()));
    }

    /// Queue a failed summary.
    pub fn push_summary_error(&self, error: BackendError) {
        self.summaries.lock().unwrap().push_back(Err(error));
    }

    /// Number of summary requests received so far.
    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    /// Queries passed to `summarize_query`, in order.
    pub fn summary_queries(&self) -> Vec<String> {
        self.summary_queries.lock().unwrap().clone()
    }

    /// Register a paper for `get_paper_by_id`.
    pub fn add_paper(&self, paper: PaperRecord) {
        self.papers.lock().unwrap().insert(paper.id.clone(), paper);
    }

    /// Register the insights outcome for a paper.
    pub fn set_insights(&self, paper_id: &str, outcome: Result<String, BackendError>) {
        self.insights
            .lock()
            .unwrap()
            .insert(paper_id.to_string(), outcome);
    }

    /// Set the category list; `None` simulates an unreachable endpoint.
    pub fn set_categories(&self, categories: Option<Vec<String>>) {
        *self.categories.lock().unwrap() = categories;
    }

    /// Set autocomplete suggestions; `None` simulates an unreachable endpoint.
    pub fn set_suggestions(&self, suggestions: Option<Vec<String>>) {
        *self.suggestions.lock().unwrap() = suggestions;
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError> {
        let guard = self.search_response.lock().unwrap();
        match &*guard {
            Some(response) => Ok(response.clone()),
            None => Ok(SearchResponse::new(Vec::new(), &query.query)),
        }
    }

    async fn summarize_query(&self, query: &str) -> Result<SummaryResponse, BackendError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.summary_queries.lock().unwrap().push(query.to_string());

        let next = self.summaries.lock().unwrap().pop_front();
        match next {
            Some(Ok(summary)) => Ok(SummaryResponse { summary }),
            Some(Err(e)) => Err(e),
            None => Err(BackendError::Network("no scripted summary".to_string())),
        }
    }

    async fn get_categories(&self) -> Vec<String> {
        self.categories.lock().unwrap().clone().unwrap_or_default()
    }

    async fn get_autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        match &*self.suggestions.lock().unwrap() {
            Some(suggestions) => suggestions.iter().take(limit).cloned().collect(),
            None => placeholder_suggestions(prefix, limit),
        }
    }

    async fn get_paper_by_id(&self, id: &str) -> Result<PaperRecord, BackendError> {
        self.papers
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    async fn generate_insights(&self, paper_id: &str) -> Result<InsightsResponse, BackendError> {
        let outcome = self.insights.lock().unwrap().get(paper_id).cloned();
        match outcome {
            Some(Ok(insights)) => Ok(InsightsResponse {
                paper_id: paper_id.to_string(),
                insights,
                generated_at: chrono::Utc::now().to_rfc3339(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(BackendError::NotFound(paper_id.to_string())),
        }
    }

    async fn search_by_doi(&self, doi: &str) -> Result<SearchResponse, BackendError> {
        let papers = self.papers.lock().unwrap();
        let results = papers
            .values()
            .filter(|p| p.doi() == Some(doi))
            .cloned()
            .collect();
        Ok(SearchResponse::new(results, doi))
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(id: &str, title: &str) -> PaperRecord {
    PaperRecord::new(id, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_script_order() {
        let backend = MockBackend::new();
        backend.push_summary_error(BackendError::Network("down".into()));
        backend.push_summary("ok");

        assert!(backend.summarize_query("q").await.is_err());
        assert_eq!(backend.summarize_query("q").await.unwrap().summary, "ok");
        assert!(backend.summarize_query("q").await.is_err());
        assert_eq!(backend.summary_calls(), 3);
    }

    #[tokio::test]
    async fn test_unimplemented_author_search() {
        let backend = MockBackend::new();
        let result = backend.search_by_author("Hinton", 10, 0).await;
        assert!(matches!(result, Err(BackendError::NotImplemented)));
    }

    #[tokio::test]
    async fn test_paper_lookup() {
        let backend = MockBackend::new();
        backend.add_paper(make_paper("2502.05707", "A paper"));
        assert!(backend.get_paper_by_id("2502.05707").await.is_ok());
        assert!(matches!(
            backend.get_paper_by_id("0000.00000").await,
            Err(BackendError::NotFound(_))
        ));
    }
}
