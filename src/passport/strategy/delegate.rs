//! One-shot outcome reporting for a single strategy invocation.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::passport::types::{Challenge, Failure, Outcome, Redirect};

/// Handle through which a strategy reports the outcome of one attempt.
///
/// Cloning is cheap and every clone reports into the same slot. The first
/// report settles the attempt; later reports are ignored with a warning.
#[derive(Clone)]
pub struct OutcomeDelegate {
    strategy: Arc<str>,
    index: usize,
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl OutcomeDelegate {
    /// Create a delegate for attempt `index` and the receiver awaiting it.
    pub(crate) fn channel(strategy: &str, index: usize) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let delegate = Self {
            strategy: Arc::from(strategy),
            index,
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (delegate, rx)
    }

    /// Accept the request as `user`.
    pub fn success(&self, user: Value, info: Option<Value>) {
        self.report(Outcome::Success { user, info });
    }

    /// Reject the request. The sequence moves on to the next strategy.
    pub fn fail(&self, challenge: Option<Challenge>, status: Option<u16>) {
        self.report(Outcome::Fail(Failure::new(challenge, status)));
    }

    /// End the sequence by redirecting the client.
    pub fn redirect(&self, url: impl Into<String>, status: Option<u16>) {
        self.report(Outcome::Redirect(Redirect::new(url, status)));
    }

    /// Abort the sequence with an internal error.
    pub fn error(&self, cause: impl std::fmt::Display) {
        self.report(Outcome::Error(cause.to_string()));
    }

    /// Whether an outcome has already been reported.
    pub fn is_settled(&self) -> bool {
        self.lock_slot().is_none()
    }

    /// Name the strategy was invoked under.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Position of this attempt in the sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    fn report(&self, outcome: Outcome) {
        let sender = self.lock_slot().take();
        match sender {
            Some(tx) => {
                debug!(
                    "Strategy '{}' (attempt {}) reported {}",
                    self.strategy,
                    self.index,
                    outcome.kind()
                );
                if tx.send(outcome).is_err() {
                    debug!(
                        "Attempt {} for strategy '{}' is no longer awaited",
                        self.index, self.strategy
                    );
                }
            }
            None => {
                warn!(
                    "Strategy '{}' reported {} after its outcome was settled, ignoring",
                    self.strategy,
                    outcome.kind()
                );
            }
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<Outcome>>> {
        // The slot only holds an Option, so a poisoned lock is still consistent
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for OutcomeDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeDelegate")
            .field("strategy", &self.strategy)
            .field("index", &self.index)
            .field("settled", &self.is_settled())
            .finish()
    }
}
