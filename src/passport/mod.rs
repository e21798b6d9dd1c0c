//! Multi-strategy authentication for poem applications.
//!
//! This module is organized into the following submodules:
//!
//! - `strategy`: Strategy trait, registry and the per-attempt outcome delegate
//! - `view`: Framework-agnostic request view handed to strategies
//! - `attempt`: Ordered trial of strategies for one request
//! - `failure`: Aggregation of rejected attempts
//! - `authenticate`: Reply, continuation and callback consumer surfaces
//! - `initialize`: Per-request context and the registration hook
//! - `scheme`: Named authentication schemes for route-level enforcement
//! - `config`: Configuration resolution with environment variable support
//! - `error`: Error type and HTTP mapping
//! - `types`: Shared data types
//!
//! # Example
//!
//! ```ignore
//! let registry = StrategyRegistry::new().with(BasicStrategy).with(BearerStrategy);
//! let passport = Passport::new(registry, PassportConfig::from_env());
//!
//! let app = Route::new()
//!     .at("/login", post(passport.authenticate("basic")))
//!     .at("/me", get(me).with(passport.authenticate(["bearer", "basic"])));
//!
//! let app = passport.register(app);
//! ```

pub mod attempt;
pub mod authenticate;
pub mod config;
pub mod error;
pub mod failure;
pub mod initialize;
pub mod instance;
pub mod scheme;
pub mod strategy;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use attempt::{AttemptSequence, SequenceEnd};
pub use authenticate::{Authenticate, AuthenticateEndpoint, CallbackEndpoint, Verdict};
pub use config::PassportConfig;
pub use error::{ErrorKind, PassportError};
pub use failure::{ConsolidatedFailure, FailureReport, consolidate};
pub use initialize::{AuthenticationContext, Initialize, InitializeEndpoint};
pub use instance::{Passport, StrategyNames};
pub use scheme::{AuthScheme, AuthSchemes, Credentials, PassportScheme, RequireScheme};
pub use strategy::{OutcomeDelegate, Strategy, StrategyRegistry};
pub use types::{AttemptOptions, AuthenticatedUser, Challenge, Failure, Outcome, Redirect};
pub use view::RequestView;
