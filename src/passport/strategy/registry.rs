//! DashMap-based strategy registry.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::traits::Strategy;

/// Name → strategy map consulted by the attempt sequencer.
///
/// Owned by a [`Passport`](crate::passport::Passport) instance rather than
/// living in global state. Registration is normally done once at startup,
/// but the map is concurrent so strategies can be swapped at runtime.
pub struct StrategyRegistry {
    strategies: DashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            strategies: DashMap::new(),
        }
    }

    /// Add a strategy under its own name.
    pub fn with(self, strategy: impl Strategy + 'static) -> Self {
        self.register(Arc::new(strategy));
        self
    }

    /// Add a strategy under an explicit name.
    pub fn with_named(self, name: impl Into<String>, strategy: impl Strategy + 'static) -> Self {
        self.register_as(name, Arc::new(strategy));
        self
    }

    /// Register a strategy under its own name, replacing any previous one.
    pub fn register(&self, strategy: Arc<dyn Strategy>) {
        let name = strategy.name().to_string();
        self.register_as(name, strategy);
    }

    /// Register a strategy under `name`, replacing any previous one.
    pub fn register_as(&self, name: impl Into<String>, strategy: Arc<dyn Strategy>) {
        let name = name.into();
        debug!("Registering authentication strategy: {}", name);
        if self.strategies.insert(name.clone(), strategy).is_some() {
            debug!("Replaced previously registered strategy: {}", name);
        }
    }

    /// Remove a strategy, returning it if it was registered.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.remove(name).map(|(_, strategy)| strategy)
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
