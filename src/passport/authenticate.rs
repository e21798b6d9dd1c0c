//! Route-level authentication.
//!
//! [`Authenticate`] is what `Passport::authenticate(names)` returns. It can
//! be used three ways:
//!
//! - **Reply mode**: as an [`Endpoint`]. Success responds with the user as
//!   JSON, rejection with 401 and the collected challenges, errors with the
//!   error itself.
//! - **Continuation mode**: as a [`Middleware`]. Success runs the wrapped
//!   endpoint with an [`AuthenticatedUser`] in the request extensions;
//!   anything else responds as in reply mode.
//! - **Callback mode**: through [`Authenticate::with_callback`]. The callback
//!   receives the raw [`Verdict`] (or the error) and owns the response.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use poem::web::Json;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use serde::Serialize;
use tracing::{debug, warn};

use super::attempt::{AttemptSequence, SequenceEnd};
use super::error::PassportError;
use super::failure::{FailureReport, consolidate};
use super::initialize::AuthenticationContext;
use super::instance::{Passport, StrategyNames};
use super::types::{AttemptOptions, AuthenticatedUser, Redirect};
use super::view::RequestView;

/// Callback-mode result of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verdict {
    Success(AuthenticatedUser),
    /// Raw per-attempt failures, see [`FailureReport`].
    Failure(FailureReport),
    Redirect(Redirect),
}

impl Verdict {
    pub fn from_end(end: SequenceEnd) -> Self {
        match end {
            SequenceEnd::Succeeded {
                strategy,
                user,
                info,
            } => Verdict::Success(authenticated(strategy, user, info)),
            SequenceEnd::Redirected(redirect) => Verdict::Redirect(redirect),
            SequenceEnd::Exhausted(failures) => {
                Verdict::Failure(FailureReport::from_failures(&failures))
            }
        }
    }
}

fn authenticated(
    strategy: String,
    user: serde_json::Value,
    info: Option<serde_json::Value>,
) -> AuthenticatedUser {
    AuthenticatedUser {
        strategy,
        user,
        info,
        authenticated_at: Utc::now(),
    }
}

/// Authenticator for a fixed list of strategies.
#[derive(Clone)]
pub struct Authenticate {
    passport: Passport,
    names: StrategyNames,
    options: AttemptOptions,
}

impl Authenticate {
    pub(crate) fn new(passport: Passport, names: StrategyNames) -> Self {
        Self {
            passport,
            names,
            options: AttemptOptions::default(),
        }
    }

    /// Options handed to every strategy.
    pub fn options(mut self, options: AttemptOptions) -> Self {
        self.options = options;
        self
    }

    pub fn names(&self) -> &StrategyNames {
        &self.names
    }

    /// Switch to callback mode.
    pub fn with_callback<F, Fut, R>(self, callback: F) -> CallbackEndpoint<F>
    where
        F: Fn(Result<Verdict, PassportError>, Request) -> Fut + Send + Sync,
        Fut: Future<Output = poem::Result<R>> + Send,
        R: IntoResponse,
    {
        CallbackEndpoint {
            auth: self,
            callback,
        }
    }

    /// Run the attempt protocol for `req`.
    ///
    /// Strategies are looked up in the passport this authenticator was built
    /// from. The request's [`AuthenticationContext`] only supplies the request
    /// id and URL, and one is attached first if the application was not
    /// wrapped with [`Passport::register`]. The view is attached to the
    /// context while strategies run.
    pub async fn attempt(&self, req: &mut Request) -> Result<SequenceEnd, PassportError> {
        let mut ctx = match req.extensions().get::<AuthenticationContext>() {
            Some(ctx) => ctx.clone(),
            None => {
                debug!("Request has no authentication context, attaching one");
                AuthenticationContext::new(req)
            }
        };

        let view =
            Arc::new(RequestView::synthesize(req, &ctx, self.passport.config()).await?);
        ctx.attach_view(view.clone());
        req.extensions_mut().insert(ctx);

        let result = AttemptSequence::new(self.passport.registry(), &self.names, &self.options)
            .run(&view)
            .await;

        if let Some(ctx) = req.extensions_mut().get_mut::<AuthenticationContext>() {
            ctx.detach_view();
        }

        result
    }

    /// Reply-mode rendering of a sequence end.
    fn reply(&self, end: SequenceEnd) -> poem::Result<Response> {
        match end {
            SequenceEnd::Succeeded { user, .. } => Ok(Json(user).into_response()),
            SequenceEnd::Redirected(redirect) => Ok(redirect.into_response()),
            SequenceEnd::Exhausted(failures) => {
                let consolidated = consolidate(&failures);
                warn!(
                    "Authentication rejected by {} strategies (challenges: {:?}, status: {:?})",
                    failures.len(),
                    consolidated.challenges,
                    consolidated.status
                );
                Err(PassportError::rejected(
                    self.passport.config().unauthorized_message.clone(),
                    consolidated,
                )
                .into())
            }
        }
    }
}

impl Endpoint for Authenticate {
    type Output = Response;

    async fn call(&self, mut req: Request) -> poem::Result<Self::Output> {
        let end = self.attempt(&mut req).await?;
        self.reply(end)
    }
}

impl<E: Endpoint> Middleware<E> for Authenticate {
    type Output = AuthenticateEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        AuthenticateEndpoint {
            inner: ep,
            auth: self.clone(),
        }
    }
}

/// Endpoint produced by using [`Authenticate`] as a middleware.
pub struct AuthenticateEndpoint<E> {
    inner: E,
    auth: Authenticate,
}

impl<E: Endpoint> Endpoint for AuthenticateEndpoint<E> {
    type Output = Response;

    async fn call(&self, mut req: Request) -> poem::Result<Self::Output> {
        match self.auth.attempt(&mut req).await? {
            SequenceEnd::Succeeded {
                strategy,
                user,
                info,
            } => {
                req.extensions_mut()
                    .insert(authenticated(strategy, user, info));
                let resp = self.inner.call(req).await?;
                Ok(resp.into_response())
            }
            end => self.auth.reply(end),
        }
    }
}

/// Endpoint produced by [`Authenticate::with_callback`].
pub struct CallbackEndpoint<F> {
    auth: Authenticate,
    callback: F,
}

impl<F, Fut, R> Endpoint for CallbackEndpoint<F>
where
    F: Fn(Result<Verdict, PassportError>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = poem::Result<R>> + Send,
    R: IntoResponse,
{
    type Output = Response;

    async fn call(&self, mut req: Request) -> poem::Result<Self::Output> {
        let result = self.auth.attempt(&mut req).await.map(Verdict::from_end);
        let resp = (self.callback)(result, req).await?;
        Ok(resp.into_response())
    }
}
