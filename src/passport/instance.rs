//! The `Passport` instance tying registry, configuration and hooks together.

use std::sync::Arc;

use poem::middleware::AddData;
use poem::{Endpoint, EndpointExt, Request, Response};

use super::authenticate::Authenticate;
use super::config::PassportConfig;
use super::initialize::{AuthenticationContext, Initialize};
use super::scheme::{AuthSchemes, PassportScheme};
use super::strategy::StrategyRegistry;

/// Ordered, immutable list of strategy names to try.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyNames(Vec<String>);

impl StrategyNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

impl From<&str> for StrategyNames {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for StrategyNames {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for StrategyNames {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for StrategyNames {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for StrategyNames {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StrategyNames {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

struct PassportInner {
    registry: StrategyRegistry,
    config: PassportConfig,
}

/// Cheap-to-clone handle to a strategy registry and its settings.
///
/// Create one at startup, install it with [`Passport::register`], and build
/// per-route authenticators with [`Passport::authenticate`].
#[derive(Clone)]
pub struct Passport {
    inner: Arc<PassportInner>,
}

impl Passport {
    pub fn new(registry: StrategyRegistry, config: PassportConfig) -> Self {
        Self {
            inner: Arc::new(PassportInner { registry, config }),
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &PassportConfig {
        &self.inner.config
    }

    /// Authenticator trying `names` in order.
    pub fn authenticate(&self, names: impl Into<StrategyNames>) -> Authenticate {
        Authenticate::new(self.clone(), names.into())
    }

    /// Middleware attaching an [`AuthenticationContext`] to each request.
    pub fn initialize(&self) -> Initialize {
        Initialize::new()
    }

    /// Attach a fresh context to `req`, replacing any existing one.
    pub fn initialize_request(&self, req: &mut Request) {
        let ctx = AuthenticationContext::new(req);
        req.extensions_mut().insert(ctx);
    }

    /// Install the passport around a whole application.
    ///
    /// Every request gets an [`AuthenticationContext`] before any route-level
    /// authentication runs, and handlers can extract the instance with
    /// `Data<&Passport>`.
    pub fn register<E>(&self, ep: E) -> impl Endpoint<Output = Response> + use<E>
    where
        E: Endpoint + 'static,
    {
        ep.with(self.initialize()).with(AddData::new(self.clone()))
    }

    /// Register the `passport` scheme with a host scheme registry.
    pub fn register_scheme(&self, schemes: &AuthSchemes) {
        schemes.register(PassportScheme::new());
    }
}

impl std::fmt::Debug for Passport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passport")
            .field("strategies", &self.inner.registry.names())
            .field("config", &self.inner.config)
            .finish()
    }
}
