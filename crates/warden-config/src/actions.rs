// SPDX-License-Identifier: Apache-2.0
//! Pre/post game hook contract (§6.2). The core exposes the trait and a
//! registry slot for it; concrete hooks are loader/collaborator
//! territory and are not shipped here.

use std::collections::BTreeMap;

/// A named hook run once at game start and once at game end.
pub trait ActionHook: Send + Sync {
    /// Runs at game start, before the first object/fact is seeded.
    ///
    /// # Errors
    /// Returns a description of the failure if the hook could not
    /// complete; a failing start hook aborts the game.
    fn on_start(&self) -> Result<(), String>;

    /// Runs at game end, after the final blackboard has been handed to
    /// the screen (§6.4).
    ///
    /// # Errors
    /// Returns a description of the failure; logged, does not reopen the
    /// game.
    fn on_end(&self) -> Result<(), String>;
}

/// Name-keyed registry of [`ActionHook`] implementations, consulted
/// against the configuration document's `Actions` section (§6.2).
#[derive(Default)]
pub struct ActionRegistry {
    hooks: BTreeMap<String, Box<dyn ActionHook>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook under `name`, replacing any prior registration.
    pub fn register(&mut self, name: impl Into<String>, hook: Box<dyn ActionHook>) {
        self.hooks.insert(name.into(), hook);
    }

    /// Looks up a registered hook by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ActionHook> {
        self.hooks.get(name).map(|hook| hook.as_ref())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHook(Arc<AtomicUsize>);
    impl ActionHook for CountingHook {
        fn on_start(&self) -> Result<(), String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn on_end(&self) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn registered_hook_runs_on_start() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry.register("announce", Box::new(CountingHook(Arc::clone(&calls))));

        registry.get("announce").unwrap().on_start().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.get("missing").is_none());
    }
}
