//! Ordered trial of strategies for one request.
//!
//! # State machine
//!
//! ```text
//! Pending(i) --lookup miss--------------------------> Errored (UnknownStrategy)
//! Pending(i) --success------------------------------> Succeeded
//! Pending(i) --fail, i + 1 < len--------------------> Pending(i + 1)
//! Pending(i) --fail, last---------------------------> Exhausted
//! Pending(i) --error / no report--------------------> Errored (Strategy / NoOutcome)
//! Pending(i) --redirect-----------------------------> Redirected
//! ```
//!
//! The sequence starts at `Pending(0)`; an empty name list is immediately
//! `Exhausted`. Strategies run one at a time and the next one starts only
//! after the previous one reported.

use tracing::{debug, error, info};

use super::error::PassportError;
use super::instance::StrategyNames;
use super::strategy::{OutcomeDelegate, StrategyRegistry};
use super::types::{AttemptOptions, Failure, Outcome, Redirect};
use super::view::RequestView;

/// Terminal, non-error state of an attempt sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEnd {
    Succeeded {
        /// Name the accepting strategy was registered under.
        strategy: String,
        user: serde_json::Value,
        info: Option<serde_json::Value>,
    },
    Redirected(Redirect),
    /// Every strategy rejected the request; one failure per strategy.
    Exhausted(Vec<Failure>),
}

/// One run of the attempt protocol over a fixed list of names.
pub struct AttemptSequence<'a> {
    registry: &'a StrategyRegistry,
    names: &'a StrategyNames,
    options: &'a AttemptOptions,
}

impl<'a> AttemptSequence<'a> {
    pub fn new(
        registry: &'a StrategyRegistry,
        names: &'a StrategyNames,
        options: &'a AttemptOptions,
    ) -> Self {
        Self {
            registry,
            names,
            options,
        }
    }

    /// Try each strategy in order against `view`.
    pub async fn run(&self, view: &RequestView) -> Result<SequenceEnd, PassportError> {
        let mut failures = Vec::with_capacity(self.names.len());

        for (index, name) in self.names.iter().enumerate() {
            let Some(strategy) = self.registry.get(name) else {
                error!(
                    request_id = %view.request_id,
                    "No strategy registered under the name: {}", name
                );
                return Err(PassportError::UnknownStrategy(name.to_string()));
            };

            debug!(
                request_id = %view.request_id,
                "Trying authentication strategy {} ({}/{})",
                name,
                index + 1,
                self.names.len()
            );

            let (delegate, outcome) = OutcomeDelegate::channel(name, index);
            strategy.authenticate(view, self.options, delegate).await;

            let Ok(outcome) = outcome.await else {
                error!(
                    request_id = %view.request_id,
                    "Strategy {} finished without reporting an outcome", name
                );
                return Err(PassportError::NoOutcome(name.to_string()));
            };

            match outcome {
                Outcome::Success { user, info } => {
                    info!(
                        request_id = %view.request_id,
                        "Authentication succeeded with strategy: {}", name
                    );
                    return Ok(SequenceEnd::Succeeded {
                        strategy: name.to_string(),
                        user,
                        info,
                    });
                }
                Outcome::Fail(failure) => {
                    debug!(
                        request_id = %view.request_id,
                        "Authentication failed with strategy: {}", name
                    );
                    failures.push(failure);
                }
                Outcome::Redirect(redirect) => {
                    debug!(
                        request_id = %view.request_id,
                        "Strategy {} redirected to {}", name, redirect.url
                    );
                    return Ok(SequenceEnd::Redirected(redirect));
                }
                Outcome::Error(cause) => {
                    error!(
                        request_id = %view.request_id,
                        "Authentication error with strategy {}: {}", name, cause
                    );
                    return Err(PassportError::Strategy(cause));
                }
            }
        }

        debug!(
            request_id = %view.request_id,
            "All {} authentication strategies failed",
            failures.len()
        );
        Ok(SequenceEnd::Exhausted(failures))
    }
}
