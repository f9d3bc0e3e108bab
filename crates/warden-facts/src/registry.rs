// SPDX-License-Identifier: Apache-2.0
//! Registry of record descriptors and the groups that name sets of them.

use crate::fields::FieldDescriptor;
use crate::FactsError;
use std::collections::{BTreeSet, HashMap};

/// Declares the shape of one record kind: its fields and the groups it
/// belongs to.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Short kind name, e.g. `"md5"` or `"mimetype"`.
    pub kind: String,
    /// Group tags this kind belongs to, expanded by [`RecordRegistry::resolve`].
    pub groups: Vec<String>,
    /// Ordered field declarations.
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Starts a descriptor for `kind` with no fields or groups yet.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            groups: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Attaches group membership.
    #[must_use]
    pub fn in_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Catalog of known record kinds and the groups they belong to.
///
/// A group name resolves to the set of kinds registered under it; a
/// reference to neither a known kind nor a known group is an error
/// (mirrors `isFact`/`isFactGroup`/`resolveFacts` in the source).
#[derive(Debug, Default)]
pub struct RecordRegistry {
    kinds: HashMap<String, RecordDescriptor>,
    groups: HashMap<String, BTreeSet<String>>,
}

impl RecordRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record kind, indexing it under every group it declares.
    ///
    /// # Errors
    /// Returns [`FactsError::DuplicateKind`] if `kind` was already registered.
    pub fn register(&mut self, descriptor: RecordDescriptor) -> Result<(), FactsError> {
        if self.kinds.contains_key(&descriptor.kind) {
            return Err(FactsError::DuplicateKind(descriptor.kind));
        }
        for group in &descriptor.groups {
            self.groups
                .entry(group.clone())
                .or_default()
                .insert(descriptor.kind.clone());
        }
        self.kinds.insert(descriptor.kind.clone(), descriptor);
        Ok(())
    }

    /// Returns the descriptor for a registered kind, if any.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&RecordDescriptor> {
        self.kinds.get(kind)
    }

    /// True if `kind` is a registered record kind.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// True if `name` is a registered group.
    #[must_use]
    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Expands a mix of kind names and group names into the flat set of
    /// kinds it denotes. Every name must resolve to a known kind or group.
    ///
    /// # Errors
    /// Returns [`FactsError::UnknownKind`]/[`FactsError::UnknownGroup`] if a
    /// name resolves to neither.
    pub fn resolve<I, S>(&self, names: I) -> Result<BTreeSet<String>, FactsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if let Some(members) = self.groups.get(name) {
                out.extend(members.iter().cloned());
            } else if self.kinds.contains_key(name) {
                out.insert(name.to_string());
            } else {
                return Err(FactsError::UnknownKind(name.to_string()));
            }
        }
        Ok(out)
    }
}
