//! Pluggable authentication strategies.
//!
//! Strategies implement [`Strategy`] and are looked up by name in a
//! [`StrategyRegistry`]. Each invocation receives a fresh
//! [`OutcomeDelegate`] through which it reports exactly one outcome.

mod delegate;
mod registry;
mod traits;

pub use delegate::OutcomeDelegate;
pub use registry::StrategyRegistry;
pub use traits::Strategy;
