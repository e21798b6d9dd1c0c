//! Scripted strategies for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::strategy::{OutcomeDelegate, Strategy};
use super::types::{AttemptOptions, Failure};
use super::view::RequestView;

/// What a [`ScriptedStrategy`] does when invoked.
#[derive(Clone)]
pub(crate) enum Script {
    Accept(Value),
    AcceptWithInfo(Value, Value),
    Reject,
    RejectWith(Failure),
    Error(String),
    Redirect(String),
    /// Drop the delegate without reporting.
    Silent,
    /// Reject, then try to accept.
    DoubleReport,
    /// Accept from a spawned task.
    Spawned(Value),
    /// Accept with a JSON rendering of the view and the options.
    Echo,
}

/// Strategy replaying a fixed [`Script`] and recording its invocations.
pub(crate) struct ScriptedStrategy {
    name: String,
    script: Script,
    calls: Arc<AtomicUsize>,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl ScriptedStrategy {
    pub(crate) fn new(name: &str, script: Script) -> Self {
        Self {
            name: name.to_string(),
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Append the strategy name to `log` on every invocation.
    pub(crate) fn logging_to(mut self, log: &Arc<Mutex<Vec<String>>>) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Shared invocation counter.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    async fn authenticate(
        &self,
        request: &RequestView,
        options: &AttemptOptions,
        delegate: OutcomeDelegate,
    ) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }

        match &self.script {
            Script::Accept(user) => delegate.success(user.clone(), None),
            Script::AcceptWithInfo(user, info) => delegate.success(user.clone(), Some(info.clone())),
            Script::Reject => delegate.fail(None, None),
            Script::RejectWith(failure) => {
                delegate.fail(failure.challenge.clone(), failure.status)
            }
            Script::Error(cause) => delegate.error(cause),
            Script::Redirect(url) => delegate.redirect(url.clone(), None),
            Script::Silent => drop(delegate),
            Script::DoubleReport => {
                delegate.fail(Some("first".into()), Some(401));
                delegate.success(json!("second"), None);
            }
            Script::Spawned(user) => {
                let user = user.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    delegate.success(user, None);
                });
            }
            Script::Echo => delegate.success(
                json!({
                    "method": request.method,
                    "url": request.url,
                    "query": request.query,
                    "body": request.body,
                    "authorization": request.authorization(),
                    "options": options,
                }),
                None,
            ),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for a failure with a text challenge.
pub(crate) fn challenge(text: &str, status: Option<u16>) -> Failure {
    Failure::new(Some(text.into()), status)
}
