// SPDX-License-Identifier: Apache-2.0
//! Generic name → metadata + constructor catalog (§4.1).

use crate::metadata::VersionGated;
use crate::RegistryError;
use semver::Version;
use std::collections::{BTreeMap, HashSet};

/// One registered analyzer/screen: its metadata plus the constructor the
/// tracker calls to build a fresh instance.
pub struct Entry<M, C> {
    /// Declared metadata.
    pub metadata: M,
    /// Constructs a fresh analyzer instance.
    pub constructor: C,
    module_id: String,
}

/// Whether duplicate class identity is a hard error (players) or a
/// warn-and-ignore (every other kind) — §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Duplicate class identity is an error.
    ErrorOnDuplicate,
    /// Duplicate class identity is logged and the second registration is
    /// dropped.
    WarnAndIgnore,
}

/// A `name → Entry` catalog for one analyzer/screen kind.
pub struct KindCatalog<M, C> {
    entries: BTreeMap<String, Entry<M, C>>,
    module_ids: HashSet<String>,
    policy: IdentityPolicy,
    kind_label: &'static str,
}

impl<M: VersionGated, C> KindCatalog<M, C> {
    /// Creates an empty catalog. `kind_label` is used only in log messages.
    #[must_use]
    pub fn new(policy: IdentityPolicy, kind_label: &'static str) -> Self {
        Self {
            entries: BTreeMap::new(),
            module_ids: HashSet::new(),
            policy,
            kind_label,
        }
    }

    /// Registers `metadata`/`constructor` under `name`, identified by
    /// `module_id` (a loader-supplied stand-in for class identity).
    ///
    /// Returns `Ok(true)` if inserted, `Ok(false)` if a duplicate was
    /// logged and ignored.
    ///
    /// # Errors
    /// Returns [`RegistryError::EngineVersionTooNew`] if the analyzer
    /// requires a newer engine than `engine_version`, or
    /// [`RegistryError::DuplicatePlayerClass`] if this catalog enforces
    /// [`IdentityPolicy::ErrorOnDuplicate`] and `module_id` repeats.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        module_id: impl Into<String>,
        metadata: M,
        constructor: C,
        engine_version: &Version,
    ) -> Result<bool, RegistryError> {
        let name = name.into();
        let module_id = module_id.into();

        if metadata.engine_version_required() > engine_version {
            return Err(RegistryError::EngineVersionTooNew {
                name,
                required: metadata.engine_version_required().clone(),
                actual: engine_version.clone(),
            });
        }

        if self.module_ids.contains(&module_id) {
            return match self.policy {
                IdentityPolicy::ErrorOnDuplicate => Err(RegistryError::DuplicatePlayerClass(module_id)),
                IdentityPolicy::WarnAndIgnore => {
                    tracing::warn!(kind = self.kind_label, %module_id, "duplicate class identity ignored");
                    Ok(false)
                }
            };
        }

        if self.entries.contains_key(&name) {
            tracing::warn!(kind = self.kind_label, %name, "duplicate display name ignored");
            return Ok(false);
        }

        self.module_ids.insert(module_id.clone());
        self.entries.insert(
            name,
            Entry {
                metadata,
                constructor,
                module_id,
            },
        );
        Ok(true)
    }

    /// Looks up an entry by display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry<M, C>> {
        self.entries.get(name)
    }

    /// Iterates all registered entries, keyed by display name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry<M, C>)> {
        self.entries.iter()
    }

    /// Consumes the catalog, handing ownership of every entry (and its
    /// constructor) to the caller. Used once at startup to build the
    /// trackers that keep the constructors alive for the rest of the game.
    pub fn into_entries(self) -> impl Iterator<Item = (String, Entry<M, C>)> {
        self.entries.into_iter()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
