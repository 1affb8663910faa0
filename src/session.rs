//! The active search and the papers referenced during a session.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::PaperRecord;

/// The query currently being shown, and when it was submitted
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSearch {
    /// `None` when no search is active
    pub query: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ActiveSearch {
    fn cleared() -> Self {
        Self {
            query: None,
            submitted_at: Utc::now(),
        }
    }
}

/// Publishes the active search to every component that reacts to it.
///
/// Submitting the same query twice still notifies subscribers, so a repeated search
/// re-triggers dependent work.
#[derive(Debug)]
pub struct SearchSession {
    tx: watch::Sender<ActiveSearch>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    /// Create a session with no active search
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ActiveSearch::cleared());
        Self { tx }
    }

    /// Make `query` the active search. Blank queries clear the session.
    pub fn submit(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.clear();
            return;
        }

        tracing::debug!("Search submitted: {}", query);
        self.tx.send_replace(ActiveSearch {
            query: Some(query.to_string()),
            submitted_at: Utc::now(),
        });
    }

    /// Clear the active search
    pub fn clear(&self) {
        tracing::debug!("Search cleared");
        self.tx.send_replace(ActiveSearch::cleared());
    }

    /// Snapshot of the active search
    pub fn current(&self) -> ActiveSearch {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<ActiveSearch> {
        self.tx.subscribe()
    }
}

/// Papers the user has pulled into the chat, in the order they were added.
///
/// The chat refers to them as `[1]`, `[2]`, ...
#[derive(Debug, Clone, Default)]
pub struct ReferencedPapers {
    papers: Vec<PaperRecord>,
}

impl ReferencedPapers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a paper. Returns `false` if a paper with the same id is already present.
    pub fn add(&mut self, paper: PaperRecord) -> bool {
        if self.papers.iter().any(|p| p.id == paper.id) {
            return false;
        }
        self.papers.push(paper);
        true
    }

    /// Remove a paper by id. Returns `true` if it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.papers.len();
        self.papers.retain(|p| p.id != id);
        self.papers.len() != before
    }

    pub fn clear(&mut self) {
        self.papers.clear();
    }

    /// Paper shown as `[n]` (1-based)
    pub fn get_numbered(&self, n: usize) -> Option<&PaperRecord> {
        n.checked_sub(1).and_then(|i| self.papers.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaperRecord> {
        self.papers.iter()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_trims_and_clears() {
        let session = SearchSession::new();
        assert_eq!(session.current().query, None);

        session.submit("  graph neural networks ");
        assert_eq!(
            session.current().query.as_deref(),
            Some("graph neural networks")
        );

        session.submit("   ");
        assert_eq!(session.current().query, None);
    }

    #[tokio::test]
    async fn test_resubmit_notifies() {
        let session = SearchSession::new();
        let mut rx = session.subscribe();

        session.submit("diffusion");
        rx.changed().await.unwrap();
        rx.borrow_and_update();

        session.submit("diffusion");
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_referenced_papers() {
        let mut papers = ReferencedPapers::new();
        assert!(papers.add(PaperRecord::new("2502.05707", "A")));
        assert!(papers.add(PaperRecord::new("2501.09123", "B")));
        assert!(!papers.add(PaperRecord::new("2502.05707", "A again")));
        assert_eq!(papers.len(), 2);

        assert_eq!(papers.get_numbered(1).unwrap().id, "2502.05707");
        assert_eq!(papers.get_numbered(2).unwrap().id, "2501.09123");
        assert!(papers.get_numbered(0).is_none());
        assert!(papers.get_numbered(3).is_none());

        assert!(papers.remove("2502.05707"));
        assert!(!papers.remove("2502.05707"));
        assert_eq!(papers.get_numbered(1).unwrap().id, "2501.09123");

        papers.clear();
        assert!(papers.is_empty());
    }
}
