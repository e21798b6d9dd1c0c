//! Data types shared by strategies, the sequencer and the consumer surfaces.
//!
//! Users and info payloads are opaque to the orchestration and travel as
//! `serde_json::Value`, so strategies decide their own shapes.

use chrono::{DateTime, Utc};
use poem::http::{StatusCode, header};
use poem::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Challenge reported by a rejecting strategy.
///
/// Text challenges end up in `WWW-Authenticate`. A numeric challenge is a
/// status code passed in challenge position and is reinterpreted as such
/// during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Challenge {
    Code(u16),
    Text(String),
}

impl From<&str> for Challenge {
    fn from(value: &str) -> Self {
        Challenge::Text(value.to_string())
    }
}

impl From<String> for Challenge {
    fn from(value: String) -> Self {
        Challenge::Text(value)
    }
}

impl From<u16> for Challenge {
    fn from(value: u16) -> Self {
        Challenge::Code(value)
    }
}

/// One rejected attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(default)]
    pub challenge: Option<Challenge>,
    #[serde(default)]
    pub status: Option<u16>,
}

impl Failure {
    pub fn new(challenge: Option<Challenge>, status: Option<u16>) -> Self {
        Self { challenge, status }
    }
}

/// Redirect requested by a strategy, forwarded to the client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub url: String,
    /// Defaults to 302 when absent or not a valid status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Redirect {
    pub fn new(url: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::FOUND)
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        Response::builder()
            .status(self.status_code())
            .header(header::LOCATION, self.url)
            .finish()
    }
}

/// What a single strategy invocation reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { user: Value, info: Option<Value> },
    Fail(Failure),
    Redirect(Redirect),
    Error(String),
}

impl Outcome {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Fail(_) => "fail",
            Outcome::Redirect(_) => "redirect",
            Outcome::Error(_) => "error",
        }
    }
}

/// Strategy-specific options, passed untouched to every strategy of an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptOptions(Map<String, Value>);

impl AttemptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for AttemptOptions {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Result of a successful attempt, threaded to downstream handlers through
/// the request extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Name of the strategy that accepted the request.
    pub strategy: String,
    pub user: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    pub authenticated_at: DateTime<Utc>,
}

/// JSON body of error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
        }
    }
}
