//! Authentication strategy trait definition.

use async_trait::async_trait;

use crate::passport::types::AttemptOptions;
use crate::passport::view::RequestView;

use super::delegate::OutcomeDelegate;

/// Trait for authentication strategies.
///
/// Implementations must be thread-safe (`Send + Sync`): one instance is
/// shared by every request through the registry, so per-attempt state
/// belongs in the future returned by `authenticate`, not in `self`.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Inspect the request and report exactly one outcome on `delegate`.
    ///
    /// The delegate may be moved into a spawned task and reported from
    /// there. Dropping it without reporting ends the attempt with an error.
    async fn authenticate(
        &self,
        request: &RequestView,
        options: &AttemptOptions,
        delegate: OutcomeDelegate,
    );

    /// Default registration name of this strategy.
    fn name(&self) -> &str;
}
