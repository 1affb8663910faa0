//! Tokio driver for [`SummaryMachine`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::{Command, SummaryMachine, SummaryState};
use super::OverviewError;
use crate::backend::SearchBackend;
use crate::citations::{render_summary, RenderedSummary};
use crate::models::CitationReference;
use crate::session::ActiveSearch;
use crate::utils::RetryPolicy;

/// Keeps the AI overview for the active query up to date.
///
/// Fetches run as spawned tasks, and failed fetches are retried on a timer following
/// the [`RetryPolicy`]. Every state change is published on a watch channel. Dropping the
/// controller aborts its in-flight request, its pending retry and any session
/// subscription.
///
/// Methods that start work must be called from within a tokio runtime.
#[derive(Debug)]
pub struct OverviewController {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    backend: Arc<dyn SearchBackend>,
    machine: Mutex<SummaryMachine>,
    tx: watch::Sender<SummaryState>,
    tasks: Mutex<Tasks>,
}

#[derive(Debug, Default)]
struct Tasks {
    fetch: Option<JoinHandle<()>>,
    retry: Option<JoinHandle<()>>,
    follow: Option<JoinHandle<()>>,
}

impl Tasks {
    fn replace(slot: &mut Option<JoinHandle<()>>, handle: JoinHandle<()>) {
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn abort_all(&mut self) {
        for handle in [self.fetch.take(), self.retry.take(), self.follow.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

impl OverviewController {
    pub fn new(backend: Arc<dyn SearchBackend>, policy: RetryPolicy) -> Self {
        let (tx, _rx) = watch::channel(SummaryState::Idle);
        Self {
            inner: Arc::new(Inner {
                backend,
                machine: Mutex::new(SummaryMachine::new(policy)),
                tx,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.inner.tx.subscribe()
    }

    pub fn state(&self) -> SummaryState {
        self.inner.tx.borrow().clone()
    }

    /// Citations of the current summary
    pub fn citations(&self) -> Vec<CitationReference> {
        self.inner.machine().citations().to_vec()
    }

    /// Current summary split into segments, if one is shown
    pub fn rendered(&self) -> Option<RenderedSummary> {
        match &*self.inner.tx.borrow() {
            SummaryState::Ready(text) => Some(render_summary(text)),
            _ => None,
        }
    }

    /// Make `query` the active query (`None` clears it) and start fetching.
    pub fn set_query(&self, query: Option<&str>) {
        self.inner.apply(|machine| machine.set_query(query));
    }

    /// Fetch again immediately with a fresh retry budget
    pub fn refresh(&self) {
        tracing::debug!("Manual summary refresh");
        self.inner.apply(SummaryMachine::refresh);
    }

    /// Track a search session: every change of the active search resets the overview.
    pub fn follow(&self, mut session: watch::Receiver<ActiveSearch>) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                let query = session.borrow_and_update().query.clone();
                match weak.upgrade() {
                    Some(inner) => inner.apply(|machine| machine.set_query(query.as_deref())),
                    None => break,
                }
                if session.changed().await.is_err() {
                    break;
                }
            }
        });

        Tasks::replace(&mut self.inner.tasks().follow, handle);
    }

    /// Wait until the active query has a summary or its retries are exhausted.
    pub async fn wait_for_outcome(&self) -> Result<String, OverviewError> {
        let mut rx = self.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            match state {
                SummaryState::Ready(text) => return Ok(text),
                SummaryState::Failed {
                    message,
                    attempt,
                    retry_in: None,
                } => {
                    return Err(OverviewError::ExhaustedRetries {
                        attempts: attempt + 1,
                        message,
                    })
                }
                SummaryState::Idle if self.inner.machine().query().is_none() => {
                    return Err(OverviewError::Inactive)
                }
                _ => {}
            }

            if rx.changed().await.is_err() {
                return Err(OverviewError::Inactive);
            }
        }
    }
}

impl Drop for OverviewController {
    fn drop(&mut self) {
        self.inner.tasks().abort_all();
    }
}

impl Inner {
    fn machine(&self) -> MutexGuard<'_, SummaryMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a transition, publish the resulting state and execute its commands
    fn apply<F>(self: &Arc<Self>, transition: F)
    where
        F: FnOnce(&mut SummaryMachine) -> Vec<Command>,
    {
        let commands = {
            let mut machine = self.machine();
            let commands = transition(&mut *machine);
            self.tx.send_replace(machine.state().clone());
            commands
        };

        for command in commands {
            self.execute(command);
        }
    }

    fn execute(self: &Arc<Self>, command: Command) {
        match command {
            Command::Fetch { query, generation } => {
                // hold the slot until the handle is stored so a fast task cannot be
                // replaced by its own predecessor
                let mut tasks = self.tasks();
                let inner = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    tracing::debug!("Requesting summary for '{}'", query);
                    match inner.backend.summarize_query(&query).await {
                        Ok(response) => {
                            tracing::info!("Summary ready for '{}'", query);
                            inner.apply(|m| m.on_success(generation, response.summary));
                        }
                        Err(e) => {
                            tracing::warn!("Summary request for '{}' failed: {}", query, e);
                            inner.apply(|m| m.on_failure(generation, e.to_string()));
                            if inner.machine().state().is_terminal_failure() {
                                tracing::error!("Giving up on summary for '{}'", query);
                            }
                        }
                    }
                });
                Tasks::replace(&mut tasks.fetch, handle);
            }
            Command::ScheduleRetry { delay, generation } => {
                tracing::info!("Retrying summary in {:?}", delay);
                let mut tasks = self.tasks();
                let weak = Arc::downgrade(self);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.apply(|m| m.on_retry_timer(generation));
                    }
                });
                Tasks::replace(&mut tasks.retry, handle);
            }
            Command::CancelRetry => {
                if let Some(handle) = self.tasks().retry.take() {
                    tracing::debug!("Cancelling pending summary retry");
                    handle.abort();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MockBackend};
    use std::time::Duration;
    use tokio::time::Instant;

    async fn wait_for<F>(rx: &mut watch::Receiver<SummaryState>, mut pred: F) -> SummaryState
    where
        F: FnMut(&SummaryState) -> bool,
    {
        loop {
            let state = rx.borrow_and_update().clone();
            if pred(&state) {
                return state;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_three_retries() {
        let backend = Arc::new(MockBackend::new());
        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());

        let start = Instant::now();
        controller.set_query(Some("vision transformers"));
        let err = controller.wait_for_outcome().await.unwrap_err();

        assert_eq!(backend.summary_calls(), 4);
        assert!(matches!(err, OverviewError::ExhaustedRetries { attempts: 4, .. }));
        assert!(start.elapsed() >= Duration::from_secs(25));
        assert!(start.elapsed() < Duration::from_secs(26));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.summary_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let backend = Arc::new(MockBackend::new());
        backend.push_summary_error(BackendError::Network("down".into()));
        backend.push_summary("Summary citing [2501.15687].");

        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());
        controller.set_query(Some("scaling"));

        let summary = controller.wait_for_outcome().await.unwrap();
        assert_eq!(summary, "Summary citing [2501.15687].");
        assert_eq!(backend.summary_calls(), 2);
        assert_eq!(controller.citations().len(), 1);
        assert!(controller.rendered().unwrap().has_citations());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_query_cancels_retry() {
        let backend = Arc::new(MockBackend::new());
        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());
        let mut rx = controller.subscribe();

        controller.set_query(Some("q"));
        wait_for(&mut rx, |s| {
            matches!(s, SummaryState::Failed { retry_in: Some(_), .. })
        })
        .await;

        controller.set_query(None);
        assert_eq!(controller.state(), SummaryState::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.summary_calls(), 1);
        assert_eq!(controller.state(), SummaryState::Idle);
        assert!(matches!(
            controller.wait_for_outcome().await,
            Err(OverviewError::Inactive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_exhaustion() {
        let backend = Arc::new(MockBackend::new());
        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());

        controller.set_query(Some("q"));
        assert!(controller.wait_for_outcome().await.is_err());

        backend.push_summary("fresh");
        controller.refresh();
        assert_eq!(controller.state(), SummaryState::Loading { attempt: 0 });

        assert_eq!(controller.wait_for_outcome().await.unwrap(), "fresh");
        assert_eq!(backend.summary_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_session() {
        let backend = Arc::new(MockBackend::new());
        backend.push_summary("first summary");
        backend.push_summary("second summary");

        let session = crate::session::SearchSession::new();
        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());
        let mut rx = controller.subscribe();
        controller.follow(session.subscribe());

        session.submit("first");
        wait_for(&mut rx, |s| *s == SummaryState::Ready("first summary".into())).await;

        session.submit("second");
        wait_for(&mut rx, |s| *s == SummaryState::Ready("second summary".into())).await;

        assert_eq!(backend.summary_queries(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_retry() {
        let backend = Arc::new(MockBackend::new());
        let controller = OverviewController::new(backend.clone(), RetryPolicy::default());
        let mut rx = controller.subscribe();

        controller.set_query(Some("q"));
        wait_for(&mut rx, |s| {
            matches!(s, SummaryState::Failed { retry_in: Some(_), .. })
        })
        .await;
        drop(controller);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.summary_calls(), 1);
    }
}
