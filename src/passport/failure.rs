//! Aggregation of rejected attempts.
//!
//! Two shapes are produced from the same failure list:
//!
//! - [`consolidate`] for reply mode: text challenges plus one representative
//!   status, rendered as a 401 response.
//! - [`FailureReport`] for callback mode: the raw per-attempt data, left for
//!   the caller to interpret.

use serde::{Deserialize, Serialize};

use super::types::{Challenge, Failure};

/// Reply-mode summary of all rejected attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedFailure {
    /// Text challenges in trial order, duplicates kept.
    pub challenges: Vec<String>,
    /// First status found in trial order.
    pub status: Option<u16>,
}

/// Reduce failures to their challenges and a representative status.
///
/// A numeric challenge counts as that attempt's status and contributes no
/// challenge. Empty text challenges are dropped.
pub fn consolidate(failures: &[Failure]) -> ConsolidatedFailure {
    let mut consolidated = ConsolidatedFailure::default();

    for failure in failures {
        let (challenge, status) = match &failure.challenge {
            Some(Challenge::Code(code)) => (None, Some(*code)),
            Some(Challenge::Text(text)) if !text.is_empty() => (Some(text), failure.status),
            Some(Challenge::Text(_)) => (None, failure.status),
            None => (None, failure.status),
        };

        if consolidated.status.is_none() {
            consolidated.status = status;
        }
        if let Some(text) = challenge {
            consolidated.challenges.push(text.clone());
        }
    }

    consolidated
}

/// Callback-mode view of the rejected attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FailureReport {
    /// Exactly one attempt was rejected.
    Single {
        challenge: Option<Challenge>,
        status: Option<u16>,
    },
    /// Zero or several attempts were rejected; parallel lists in trial order.
    Multiple {
        challenges: Vec<Option<Challenge>>,
        statuses: Vec<Option<u16>>,
    },
}

impl FailureReport {
    pub fn from_failures(failures: &[Failure]) -> Self {
        if let [only] = failures {
            return FailureReport::Single {
                challenge: only.challenge.clone(),
                status: only.status,
            };
        }

        FailureReport::Multiple {
            challenges: failures.iter().map(|f| f.challenge.clone()).collect(),
            statuses: failures.iter().map(|f| f.status).collect(),
        }
    }
}
