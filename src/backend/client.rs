//! HTTP implementation of the search backend.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{placeholder_suggestions, BackendError, SearchBackend};
use crate::config::BackendConfig;
use crate::models::{InsightsResponse, PaperRecord, SearchQuery, SearchResponse, SummaryResponse};
use crate::utils::HttpClient;

const API_PREFIX: &str = "/api/v1";

/// Search engine service reached over HTTP
///
/// All endpoints live under `{base_url}/api/v1`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: HttpClient,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend for the given base URL with default timeouts
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = HttpClient::new()?;
        Self::with_client(base_url, client)
    }

    /// Create a backend from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_seconds))?;
        Self::with_client(&config.base_url, client)
    }

    /// Create a backend sharing an existing HTTP client
    pub fn with_client(base_url: &str, client: HttpClient) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            BackendError::InvalidRequest(format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        tracing::debug!("Search backend client initialized with URL: {}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL of the backend
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full endpoint URL
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            API_PREFIX,
            path
        )
    }

    /// Turn a non-success response into an error
    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Http { status, body })
    }

    /// Decode a JSON response body
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(format!("Failed to parse JSON: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to reach {}: {}", url, e)))?;

        Self::read_json(Self::check_status(response).await?).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let mut request = self.client.client().post(&url);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to reach {}: {}", url, e)))?;

        Self::read_json(Self::check_status(response).await?).await
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError> {
        let body = serde_json::to_value(query)?;
        self.post_json("/search", Some(&body)).await.map_err(|e| {
            tracing::error!("Search API error: {}", e);
            e
        })
    }

    async fn summarize_query(&self, query: &str) -> Result<SummaryResponse, BackendError> {
        let body = serde_json::json!({ "query": query });
        self.post_json("/summarize-query", Some(&body))
            .await
            .map_err(|e| {
                tracing::error!("Query summary API error: {}", e);
                e
            })
    }

    async fn get_categories(&self) -> Vec<String> {
        match self.get_json::<Vec<String>>("/categories").await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!("Categories API error: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        let path = format!(
            "/autocomplete?prefix={}&limit={}",
            urlencoding::encode(prefix),
            limit
        );

        match self.get_json::<Value>(&path).await {
            Ok(body) => {
                let mut suggestions = unwrap_suggestions(&body);
                suggestions.truncate(limit);
                suggestions
            }
            Err(e) => {
                tracing::warn!("Autocomplete API error: {}", e);
                placeholder_suggestions(prefix, limit)
            }
        }
    }

    async fn get_paper_by_id(&self, id: &str) -> Result<PaperRecord, BackendError> {
        let path = format!("/paper/{}", urlencoding::encode(id));
        self.get_json(&path).await.map_err(|e| match e {
            BackendError::Http { status, .. } if status == StatusCode::NOT_FOUND => {
                BackendError::NotFound(id.to_string())
            }
            other => {
                tracing::error!("Paper fetch API error: {}", other);
                other
            }
        })
    }

    async fn generate_insights(&self, paper_id: &str) -> Result<InsightsResponse, BackendError> {
        let path = format!("/paper/{}/insights", urlencoding::encode(paper_id));
        self.post_json(&path, None).await.map_err(|e| {
            tracing::error!("Insights API error: {}", e);
            e
        })
    }

    async fn search_by_author(
        &self,
        author: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchResponse, BackendError> {
        let path = format!(
            "/author/{}?limit={}&offset={}",
            urlencoding::encode(author),
            limit,
            offset
        );
        self.get_json(&path).await.map_err(|e| {
            tracing::error!("Author search API error: {}", e);
            e
        })
    }

    async fn search_by_doi(&self, doi: &str) -> Result<SearchResponse, BackendError> {
        let path = format!("/doi/{}", urlencoding::encode(doi));
        self.get_json(&path).await.map_err(|e| {
            tracing::error!("DOI search API error: {}", e);
            e
        })
    }
}

/// Flatten an autocomplete body into plain suggestion strings.
///
/// Accepts a plain string array, an array of `{"text": ..}` options, an object with a
/// `suggestions` array, or an Elasticsearch suggester envelope
/// (`{"suggest": {"name": [{"options": [{"text": ..}]}]}}`). Order is kept and
/// duplicates dropped.
pub(crate) fn unwrap_suggestions(body: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_suggestions(body, &mut out);

    let mut seen = std::collections::HashSet::new();
    out.retain(|s| seen.insert(s.clone()));
    out
}

fn collect_suggestions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_suggestions(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(options) = map.get("options") {
                collect_suggestions(options, out);
            } else if let Some(Value::String(text)) = map.get("text") {
                out.push(text.clone());
            } else if let Some(suggestions) = map.get("suggestions") {
                collect_suggestions(suggestions, out);
            } else if let Some(Value::Object(suggesters)) = map.get("suggest") {
                for entries in suggesters.values() {
                    collect_suggestions(entries, out);
                }
            }
        }
        _ => {}
    }
}
