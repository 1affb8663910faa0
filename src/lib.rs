//! # Paper Scout
//!
//! Client-side toolkit for an academic paper search product backed by an external
//! search-and-AI service.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (PaperRecord, SearchQuery, CitationReference, etc.)
//! - [`backend`]: Typed client for the search/AI backend with a trait-based seam
//! - [`citations`]: Citation extraction and rendering for AI-generated summaries
//! - [`overview`]: Summary state machine and retry controller
//! - [`session`]: Active search observable and the referenced-papers collection
//! - [`relay`]: Local HTTP relay for paper insights
//! - [`utils`]: HTTP client, retry policy and markdown helpers
//! - [`config`]: Configuration management

pub mod backend;
pub mod citations;
pub mod config;
pub mod models;
pub mod overview;
pub mod relay;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use backend::{BackendError, HttpBackend, SearchBackend};
pub use citations::{extract_citations, render_summary};
pub use models::{CitationReference, PaperRecord};
pub use overview::{OverviewController, SummaryState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
