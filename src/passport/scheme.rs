//! Named authentication schemes.
//!
//! Routes can require a scheme by name through [`AuthSchemes::require`].
//! The passport registers itself as the `passport` scheme; its check is a
//! thin fallback, the real work happens in [`Authenticate`](super::Authenticate).

use std::sync::Arc;

use dashmap::DashMap;
use poem::http::header;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::{PassportError, UNAUTHORIZED_MESSAGE};
use super::types::AuthenticatedUser;

/// Credentials produced by a scheme, stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: Value,
}

/// A named check a route can require.
pub trait AuthScheme: Send + Sync {
    fn name(&self) -> &str;

    fn authenticate(&self, req: &Request) -> Result<Credentials, PassportError>;
}

/// The `passport` scheme.
///
/// Accepts any request carrying an `Authorization` header, using the user
/// resolved by an earlier [`Authenticate`](super::Authenticate) (or `null`)
/// as credentials. Rejects everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassportScheme;

impl PassportScheme {
    pub const NAME: &'static str = "passport";

    pub fn new() -> Self {
        Self
    }
}

impl AuthScheme for PassportScheme {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn authenticate(&self, req: &Request) -> Result<Credentials, PassportError> {
        if !req.headers().contains_key(header::AUTHORIZATION) {
            return Err(PassportError::unauthorized(UNAUTHORIZED_MESSAGE));
        }

        let user = req
            .extensions()
            .get::<AuthenticatedUser>()
            .map(|authenticated| authenticated.user.clone())
            .unwrap_or(Value::Null);
        Ok(Credentials { user })
    }
}

/// Host-side registry of schemes.
#[derive(Clone, Default)]
pub struct AuthSchemes {
    schemes: Arc<DashMap<String, Arc<dyn AuthScheme>>>,
}

impl AuthSchemes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scheme: impl AuthScheme + 'static) {
        let name = scheme.name().to_string();
        debug!("Registering authentication scheme: {}", name);
        self.schemes.insert(name, Arc::new(scheme));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthScheme>> {
        self.schemes.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemes.contains_key(name)
    }

    /// Middleware enforcing the scheme registered under `name`.
    ///
    /// The lookup happens per request, so the scheme may be registered after
    /// the route is built.
    pub fn require(&self, name: impl Into<String>) -> RequireScheme {
        RequireScheme {
            schemes: self.clone(),
            name: name.into(),
        }
    }
}

/// Middleware returned by [`AuthSchemes::require`].
pub struct RequireScheme {
    schemes: AuthSchemes,
    name: String,
}

impl<E: Endpoint> Middleware<E> for RequireScheme {
    type Output = RequireSchemeEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequireSchemeEndpoint {
            inner: ep,
            schemes: self.schemes.clone(),
            name: self.name.clone(),
        }
    }
}

/// Endpoint produced by [`RequireScheme`].
pub struct RequireSchemeEndpoint<E> {
    inner: E,
    schemes: AuthSchemes,
    name: String,
}

impl<E: Endpoint> Endpoint for RequireSchemeEndpoint<E> {
    type Output = Response;

    async fn call(&self, mut req: Request) -> poem::Result<Self::Output> {
        let scheme = self
            .schemes
            .get(&self.name)
            .ok_or_else(|| PassportError::UnknownScheme(self.name.clone()))?;

        let credentials = scheme.authenticate(&req)?;
        req.extensions_mut().insert(credentials);

        let resp = self.inner.call(req).await?;
        Ok(resp.into_response())
    }
}
