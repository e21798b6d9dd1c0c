//! Errors surfaced by the authentication orchestration.
//!
//! # Classification
//!
//! Every [`PassportError`] falls into one [`ErrorKind`]:
//!
//! 1. **Configuration**: a referenced strategy or scheme is not registered.
//!    Fatal for the current attempt, never retried.
//! 2. **Strategy**: a strategy reported an internal fault or never reported
//!    at all. The attempt sequence stops at that strategy.
//! 3. **Unauthorized**: every strategy rejected the request. A normal
//!    terminal outcome rendered as 401 with the collected challenges.
//! 4. **Request**: the inbound request could not be turned into a view
//!    (unreadable, oversized or malformed body or query).
//!
//! `PassportError` implements [`ResponseError`], so `?` converts it into a
//! `poem::Error` carrying a JSON [`ErrorBody`].

use poem::error::ResponseError;
use poem::http::{StatusCode, header};
use poem::web::Json;
use poem::{IntoResponse, Response};
use thiserror::Error;

use super::failure::ConsolidatedFailure;
use super::types::ErrorBody;

/// Default message of unauthorized responses.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Error category, see the module documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Strategy,
    Unauthorized,
    Request,
}

#[derive(Debug, Error)]
pub enum PassportError {
    #[error("No strategy registered under the name: {0}")]
    UnknownStrategy(String),

    #[error("No authentication scheme registered under the name: {0}")]
    UnknownScheme(String),

    #[error("Passport Error: {0}")]
    Strategy(String),

    #[error("Passport Error: strategy '{0}' finished without reporting an outcome")]
    NoOutcome(String),

    #[error("{message}")]
    Unauthorized {
        message: String,
        /// Challenges for `WWW-Authenticate`, in trial order.
        challenges: Vec<String>,
        /// Representative status of the rejected attempts. Metadata only,
        /// the response status is always 401.
        status: Option<u16>,
    },

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    Body(#[from] std::io::Error),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl PassportError {
    /// Unauthorized error without challenges.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PassportError::Unauthorized {
            message: message.into(),
            challenges: Vec::new(),
            status: None,
        }
    }

    /// Unauthorized error carrying the consolidated result of the attempts.
    pub fn rejected(message: impl Into<String>, consolidated: ConsolidatedFailure) -> Self {
        PassportError::Unauthorized {
            message: message.into(),
            challenges: consolidated.challenges,
            status: consolidated.status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PassportError::UnknownStrategy(_) | PassportError::UnknownScheme(_) => {
                ErrorKind::Configuration
            }
            PassportError::Strategy(_) | PassportError::NoOutcome(_) => ErrorKind::Strategy,
            PassportError::Unauthorized { .. } => ErrorKind::Unauthorized,
            PassportError::PayloadTooLarge(_)
            | PassportError::Body(_)
            | PassportError::MalformedRequest(_) => ErrorKind::Request,
        }
    }

    /// Challenges carried by an unauthorized error, empty otherwise.
    pub fn challenges(&self) -> &[String] {
        match self {
            PassportError::Unauthorized { challenges, .. } => challenges,
            _ => &[],
        }
    }
}

impl ResponseError for PassportError {
    fn status(&self) -> StatusCode {
        match self {
            PassportError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            PassportError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PassportError::Body(_) | PassportError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            PassportError::UnknownStrategy(_)
            | PassportError::UnknownScheme(_)
            | PassportError::Strategy(_)
            | PassportError::NoOutcome(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response
    where
        Self: std::error::Error + Send + Sync + 'static,
    {
        let status = self.status();
        let mut resp = Json(ErrorBody::new(status, self.to_string()))
            .with_status(status)
            .into_response();

        let challenges = self.challenges();
        if !challenges.is_empty()
            && let Ok(value) = challenges.join(", ").parse()
        {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        resp
    }
}
