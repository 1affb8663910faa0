//! Summary lifecycle as a synchronous state machine.
//!
//! [`SummaryMachine`] holds no timers and performs no I/O. Every transition returns the
//! [`Command`]s a driver must execute, which keeps the retry rules testable without a
//! runtime.

use serde::Serialize;
use std::time::Duration;

use crate::citations::extract_citations;
use crate::models::CitationReference;
use crate::utils::RetryPolicy;

/// Message shown once automatic retries are exhausted
pub const EXHAUSTED_MESSAGE: &str = "Failed to generate summary after multiple attempts.";

/// What the overview card shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SummaryState {
    /// No request made for the active query yet (or no active query)
    Idle,
    /// A request is in flight; `attempt` is the number of retries before it
    Loading { attempt: u32 },
    /// Summary text
    Ready(String),
    /// The last request failed. `retry_in` is `None` once retries are exhausted.
    Failed {
        message: String,
        attempt: u32,
        #[serde(with = "optional_millis")]
        retry_in: Option<Duration>,
    },
}

impl SummaryState {
    /// Failed with no retry pending
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, SummaryState::Failed { retry_in: None, .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SummaryState::Loading { .. })
    }
}

mod optional_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }
}

/// Side effects requested by the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Issue one summary request
    Fetch { query: String, generation: u64 },
    /// Start the retry timer
    ScheduleRetry { delay: Duration, generation: u64 },
    /// Stop the retry timer if it is running
    CancelRetry,
}

/// Summary state for one active query at a time.
///
/// `generation` is bumped on every query change and manual refresh. Fetch results and
/// timer expiries carry the generation they were issued under and are dropped when it
/// no longer matches.
#[derive(Debug)]
pub struct SummaryMachine {
    policy: RetryPolicy,
    query: Option<String>,
    state: SummaryState,
    attempt: u32,
    citations: Vec<CitationReference>,
    generation: u64,
    retry_pending: bool,
}

impl SummaryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            query: None,
            state: SummaryState::Idle,
            attempt: 0,
            citations: Vec::new(),
            generation: 0,
            retry_pending: false,
        }
    }

    pub fn state(&self) -> &SummaryState {
        &self.state
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Retries made for the current query
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Citations of the current summary
    pub fn citations(&self) -> &[CitationReference] {
        &self.citations
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Switch to a new active query (or none) and start fetching it.
    pub fn set_query(&mut self, query: Option<&str>) -> Vec<Command> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let mut commands = self.reset();
        self.query = query.map(str::to_string);
        commands.extend(self.start());
        commands
    }

    /// Begin fetching if nothing is shown, loading, or failed for the active query.
    pub fn start(&mut self) -> Vec<Command> {
        let Some(query) = self.query.clone() else {
            return Vec::new();
        };
        if self.state != SummaryState::Idle {
            return Vec::new();
        }

        self.state = SummaryState::Loading {
            attempt: self.attempt,
        };
        vec![Command::Fetch {
            query,
            generation: self.generation,
        }]
    }

    /// Manual refresh: fetch again right away, with a fresh retry budget.
    pub fn refresh(&mut self) -> Vec<Command> {
        if self.query.is_none() {
            return Vec::new();
        }
        let mut commands = self.reset();
        commands.extend(self.start());
        commands
    }

    /// Apply a successful response
    pub fn on_success(&mut self, generation: u64, summary: String) -> Vec<Command> {
        if !self.accepts_result(generation) {
            return Vec::new();
        }

        self.citations = extract_citations(summary.as_str());
        self.attempt = 0;
        self.state = SummaryState::Ready(summary);
        Vec::new()
    }

    /// Apply a failed response
    pub fn on_failure(&mut self, generation: u64, message: String) -> Vec<Command> {
        if !self.accepts_result(generation) {
            return Vec::new();
        }

        if self.policy.should_retry(self.attempt) {
            let delay = self.policy.delay(self.attempt);
            self.state = SummaryState::Failed {
                message,
                attempt: self.attempt,
                retry_in: Some(delay),
            };
            self.retry_pending = true;
            vec![Command::ScheduleRetry {
                delay,
                generation: self.generation,
            }]
        } else {
            self.state = SummaryState::Failed {
                message: EXHAUSTED_MESSAGE.to_string(),
                attempt: self.attempt,
                retry_in: None,
            };
            Vec::new()
        }
    }

    /// The retry timer fired
    pub fn on_retry_timer(&mut self, generation: u64) -> Vec<Command> {
        if generation != self.generation || !self.retry_pending {
            return Vec::new();
        }

        self.retry_pending = false;
        self.attempt += 1;
        self.state = SummaryState::Idle;
        self.start()
    }

    fn accepts_result(&self, generation: u64) -> bool {
        generation == self.generation && self.state.is_loading()
    }

    fn reset(&mut self) -> Vec<Command> {
        self.generation += 1;
        self.attempt = 0;
        self.citations.clear();
        self.state = SummaryState::Idle;

        if std::mem::take(&mut self.retry_pending) {
            vec![Command::CancelRetry]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_generation(commands: &[Command]) -> u64 {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Fetch { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("fetch command")
    }

    #[test]
    fn test_states_serialize_to_json() {
        use serde_json::json;

        let cases = [
            (SummaryState::Idle, json!({"state": "idle"})),
            (
                SummaryState::Loading { attempt: 1 },
                json!({"state": "loading", "detail": {"attempt": 1}}),
            ),
            (
                SummaryState::Ready("x".into()),
                json!({"state": "ready", "detail": "x"}),
            ),
            (
                SummaryState::Failed {
                    message: "down".into(),
                    attempt: 0,
                    retry_in: Some(Duration::from_secs(5)),
                },
                json!({"state": "failed", "detail": {"message": "down", "attempt": 0, "retry_in": 5000}}),
            ),
            (
                SummaryState::Failed {
                    message: EXHAUSTED_MESSAGE.into(),
                    attempt: 3,
                    retry_in: None,
                },
                json!({"state": "failed", "detail": {"message": EXHAUSTED_MESSAGE, "attempt": 3, "retry_in": null}}),
            ),
        ];

        for (state, expected) in cases {
            assert_eq!(serde_json::to_value(&state).unwrap(), expected);
        }
    }

    #[test]
    fn test_idle_without_query() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        assert!(machine.start().is_empty());
        assert!(machine.refresh().is_empty());
        assert_eq!(machine.state(), &SummaryState::Idle);
    }

    #[test]
    fn test_success_extracts_citations() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        let commands = machine.set_query(Some("transformers"));
        assert_eq!(
            commands,
            vec![Command::Fetch {
                query: "transformers".into(),
                generation: 1
            }]
        );
        assert_eq!(machine.state(), &SummaryState::Loading { attempt: 0 });

        // a second start while loading issues nothing
        assert!(machine.start().is_empty());

        machine.on_success(1, "Great work [2501.15687].".into());
        assert!(matches!(machine.state(), SummaryState::Ready(_)));
        assert_eq!(machine.citations().len(), 1);
    }

    #[test]
    fn test_retry_schedule_and_exhaustion() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        let generation = fetch_generation(&machine.set_query(Some("q")));

        let mut delays = Vec::new();
        let mut fetches = 1;
        loop {
            let commands = machine.on_failure(generation, "boom".into());
            match commands.as_slice() {
                [Command::ScheduleRetry { delay, .. }] => {
                    delays.push(*delay);
                    let next = machine.on_retry_timer(generation);
                    assert_eq!(fetch_generation(&next), generation);
                    fetches += 1;
                }
                [] => break,
                other => panic!("unexpected commands {:?}", other),
            }
        }

        assert_eq!(fetches, 4);
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(10)
            ]
        );
        assert_eq!(
            machine.state(),
            &SummaryState::Failed {
                message: EXHAUSTED_MESSAGE.into(),
                attempt: 3,
                retry_in: None
            }
        );
        assert!(machine.start().is_empty());
    }

    #[test]
    fn test_success_resets_attempt() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        machine.set_query(Some("q"));
        machine.on_failure(1, "boom".into());
        machine.on_retry_timer(1);
        assert_eq!(machine.attempt(), 1);

        machine.on_success(1, "ok".into());
        assert_eq!(machine.attempt(), 0);
        assert_eq!(machine.state(), &SummaryState::Ready("ok".into()));
    }

    #[test]
    fn test_query_change_cancels_retry() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        machine.set_query(Some("first"));
        machine.on_failure(1, "boom".into());

        let commands = machine.set_query(None);
        assert_eq!(commands, vec![Command::CancelRetry]);
        assert_eq!(machine.state(), &SummaryState::Idle);

        // a timer that fires anyway is ignored
        assert!(machine.on_retry_timer(1).is_empty());
        assert_eq!(machine.state(), &SummaryState::Idle);
    }

    #[test]
    fn test_stale_result_ignored() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        machine.set_query(Some("first"));
        machine.set_query(Some("second"));

        machine.on_success(1, "about first".into());
        assert_eq!(machine.state(), &SummaryState::Loading { attempt: 0 });

        machine.on_success(2, "about second".into());
        assert_eq!(machine.state(), &SummaryState::Ready("about second".into()));
    }

    #[test]
    fn test_refresh_after_exhaustion() {
        let mut machine = SummaryMachine::new(RetryPolicy::default().max_attempts(0));
        machine.set_query(Some("q"));
        assert!(machine.on_failure(1, "boom".into()).is_empty());
        assert!(machine.state().is_terminal_failure());

        let commands = machine.refresh();
        assert_eq!(fetch_generation(&commands), 2);
        assert_eq!(machine.state(), &SummaryState::Loading { attempt: 0 });
    }

    #[test]
    fn test_refresh_during_pending_retry() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        machine.set_query(Some("q"));
        machine.on_failure(1, "boom".into());

        let commands = machine.refresh();
        assert_eq!(commands[0], Command::CancelRetry);
        assert_eq!(fetch_generation(&commands), 2);
    }

    #[test]
    fn test_blank_query_is_inactive() {
        let mut machine = SummaryMachine::new(RetryPolicy::default());
        assert!(machine.set_query(Some("   ")).is_empty());
        assert_eq!(machine.query(), None);
    }
}
