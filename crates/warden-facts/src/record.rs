// SPDX-License-Identifier: Apache-2.0
//! Fact/hypothesis record values, validated against a [`RecordDescriptor`].

use crate::fields::FieldValue;
use crate::registry::RecordDescriptor;
use crate::FactsError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The six provenance edge directions a record carries (§3.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Ids of objects this record was derived from.
    pub parent_objects: BTreeSet<u64>,
    /// Ids of facts this record was derived from.
    pub parent_facts: BTreeSet<u64>,
    /// Ids of hypotheses this record was derived from.
    pub parent_hyps: BTreeSet<u64>,
    /// Ids of objects derived from this record.
    pub child_objects: BTreeSet<u64>,
    /// Ids of facts derived from this record.
    pub child_facts: BTreeSet<u64>,
    /// Ids of hypotheses derived from this record.
    pub child_hyps: BTreeSet<u64>,
}

/// A typed record: a fact if `tainted == false`, a hypothesis if
/// `tainted == true`. Identical shape either way; the taint flag is what
/// routes it to the fact table or the hypothesis table (§3.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record kind, e.g. `"md5"`.
    pub kind: String,
    /// Declared field values, keyed by field name.
    pub fields: BTreeMap<String, FieldValue>,
    /// Table-assigned id; `None` until inserted.
    pub id: Option<u64>,
    /// Display name of the emitting analyzer instance, or `"GameMaster"`.
    pub creator: String,
    /// Wall-clock construction timestamp (seconds since epoch).
    pub created: f64,
    /// `true` for a hypothesis, `false` for a fact.
    pub tainted: bool,
    /// Parent/child edges.
    pub provenance: Provenance,
}

impl Record {
    /// Validates `fields` against `descriptor` (required fields present,
    /// types match, allowed-value and list-element constraints satisfied)
    /// and constructs an unassigned (`id: None`) record.
    ///
    /// # Errors
    /// Returns a [`FactsError`] describing the first validation failure.
    pub fn new(
        descriptor: &RecordDescriptor,
        mut fields: BTreeMap<String, FieldValue>,
        creator: impl Into<String>,
        created: f64,
        tainted: bool,
    ) -> Result<Self, FactsError> {
        let mut resolved = BTreeMap::new();
        for field in &descriptor.fields {
            match fields.remove(&field.name) {
                Some(value) => {
                    field.validate(&value)?;
                    resolved.insert(field.name.clone(), value);
                }
                None => {
                    if field.required {
                        return Err(FactsError::MissingField(field.name.clone()));
                    }
                    if let Some(default) = &field.default {
                        resolved.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }
        if let Some((name, _)) = fields.into_iter().next() {
            return Err(FactsError::UnknownField(name));
        }
        Ok(Self {
            kind: descriptor.kind.clone(),
            fields: resolved,
            id: None,
            creator: creator.into(),
            created,
            tainted,
            provenance: Provenance::default(),
        })
    }

    /// Clears the taint flag, turning a hypothesis into a fact-shaped
    /// value. Used exclusively by hypothesis promotion (§4.4.5).
    pub fn untaint(&mut self) {
        self.tainted = false;
    }

    /// Sets the taint flag. Used when an analyzer emits a hypothesis.
    pub fn taint(&mut self) {
        self.tainted = true;
    }

    /// Looks up a declared field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
