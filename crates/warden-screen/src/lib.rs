// SPDX-License-Identifier: Apache-2.0
//! Read-only presentation runner (§4.7). Screens are stateless presenters
//! — the runner builds one instance and reuses it across every
//! `filter()`/`present()` call, matching the registry's shared-instance
//! convention for this analyzer kind.

mod error;

pub use error::ScreenError;

use warden_analyzer::ScreenAnalyzer;
use warden_blackboard::BlackboardView;
use warden_config::{validate_options, OptionBag};
use warden_registry::{ScreenConstructor, ScreenMetadata};

/// A built screen instance, ready to filter or present blackboard
/// snapshots.
pub struct ScreenRunner {
    name: String,
    instance: Box<dyn ScreenAnalyzer>,
}

impl ScreenRunner {
    /// Validates `options` against `metadata`'s declared schema, then
    /// builds the screen instance via `constructor`.
    ///
    /// # Errors
    /// Returns [`ScreenError::InvalidOptions`] if `options` fails schema
    /// validation, or [`ScreenError::Creation`] if the constructor
    /// itself fails.
    pub fn build(name: String, metadata: &ScreenMetadata, constructor: &ScreenConstructor, options: &OptionBag) -> Result<Self, ScreenError> {
        validate_options(&metadata.options_schema, options).map_err(|source| ScreenError::InvalidOptions {
            name: name.clone(),
            source,
        })?;
        let instance = constructor().map_err(|reason| ScreenError::Creation {
            name: name.clone(),
            reason,
        })?;
        Ok(Self { name, instance })
    }

    /// Display name of the screen this runner wraps.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces a structured snapshot of `view` (§4.7).
    #[must_use]
    pub fn filter(&self, view: BlackboardView<'_>) -> serde_json::Value {
        self.instance.filter(view)
    }

    /// Produces a serialised report of `view` (§4.7, §6.4).
    #[must_use]
    pub fn present(&self, view: BlackboardView<'_>) -> String {
        self.instance.present(view)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use semver::Version;
    use warden_blackboard::{FactTable, HypothesisTable, ObjectList};
    use warden_facts::RecordDescriptor;

    struct CountingScreen;
    impl ScreenAnalyzer for CountingScreen {
        fn filter(&self, view: BlackboardView<'_>) -> serde_json::Value {
            serde_json::json!({ "facts": view.facts.len() })
        }
        fn present(&self, view: BlackboardView<'_>) -> String {
            format!("{} facts", view.facts.len())
        }
    }

    fn metadata() -> ScreenMetadata {
        ScreenMetadata {
            name: "Counts".to_string(),
            version: Version::parse("1.0.0").unwrap(),
            engine_version_required: Version::parse("1.0.0").unwrap(),
            options_schema: RecordDescriptor::new("Counts"),
        }
    }

    #[test]
    fn builds_and_presents() {
        let constructor: ScreenConstructor = Box::new(|| Ok(Box::new(CountingScreen) as Box<dyn ScreenAnalyzer>));
        let runner = ScreenRunner::build("Counts".to_string(), &metadata(), &constructor, &OptionBag::new()).unwrap();

        let facts = FactTable::new();
        let hyps = HypothesisTable::new();
        let objects = ObjectList::new();
        let view = BlackboardView {
            facts: &facts,
            hyps: &hyps,
            objects: &objects,
        };

        assert_eq!(runner.name(), "Counts");
        assert_eq!(runner.present(view), "0 facts");
    }

    #[test]
    fn rejects_unknown_options() {
        let constructor: ScreenConstructor = Box::new(|| Ok(Box::new(CountingScreen) as Box<dyn ScreenAnalyzer>));
        let mut options = OptionBag::new();
        options.insert("nope".to_string(), serde_json::json!(true));
        let err = ScreenRunner::build("Counts".to_string(), &metadata(), &constructor, &options).unwrap_err();
        assert!(matches!(err, ScreenError::InvalidOptions { .. }));
    }
}
