//! Utility modules.
//!
//! - [`HttpClient`]: shared HTTP client with timeouts and a user agent
//! - [`RetryPolicy`]: capped exponential backoff for summary retries
//! - [`format_insights`]: normalise AI-generated paper insights into markdown
//! - [`format_citation`]: APA and BibTeX citations for a paper
//!
//! # Retry with Backoff
//!
//! ```rust
//! use std::time::Duration;
//! use paper_scout::utils::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.delay(0), Duration::from_secs(5));
//! assert_eq!(policy.delay(1), Duration::from_secs(10));
//! assert!(!policy.should_retry(3));
//! ```

mod cite;
mod http;
mod markdown;
mod retry;

pub use cite::{format_citation, CitationStyle, StructuredCitation};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use markdown::format_insights;
pub use retry::RetryPolicy;
