//! Core data models for papers, search requests and AI-generated content.

mod citation;
mod paper;
mod search;

pub use citation::CitationReference;
pub use paper::{PaperMetadata, PaperRecord, PaperRecordBuilder};
pub use search::{InsightsResponse, SearchQuery, SearchResponse, SummaryResponse};
