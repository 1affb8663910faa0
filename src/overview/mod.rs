//! AI overview of the active search, with automatic retries.
//!
//! [`SummaryMachine`] decides what happens; [`OverviewController`] makes it happen on a
//! tokio runtime.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paper_scout::backend::HttpBackend;
//! use paper_scout::overview::OverviewController;
//! use paper_scout::utils::RetryPolicy;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new("http://localhost:8000")?);
//! let controller = OverviewController::new(backend, RetryPolicy::default());
//! controller.set_query(Some("graph neural networks"));
//! let summary = controller.wait_for_outcome().await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

mod controller;
mod state;

pub use controller::OverviewController;
pub use state::{Command, SummaryMachine, SummaryState, EXHAUSTED_MESSAGE};

/// Why no summary is available
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverviewError {
    /// Every automatic attempt failed
    #[error("{message} ({attempts} requests made)")]
    ExhaustedRetries { attempts: u32, message: String },

    /// There is no active query
    #[error("No active query")]
    Inactive,
}
