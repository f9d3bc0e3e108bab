// SPDX-License-Identifier: Apache-2.0
//! Fact and hypothesis tables (§3.2, §4.2).

use crate::BlackboardError;
use std::collections::{BTreeMap, HashMap};
use warden_facts::{Record, RecordRegistry};

/// Shared storage backing both [`FactTable`] and [`HypothesisTable`];
/// the taint flag fixed at construction decides which records a table
/// will accept.
#[derive(Debug)]
struct RecordTable {
    taint: bool,
    next_id: u64,
    columns: BTreeMap<String, Vec<u64>>,
    by_id: HashMap<u64, Record>,
}

impl RecordTable {
    fn new(taint: bool) -> Self {
        Self {
            taint,
            next_id: 0,
            columns: BTreeMap::new(),
            by_id: HashMap::new(),
        }
    }

    fn add(&mut self, registry: &RecordRegistry, mut record: Record) -> Result<u64, BlackboardError> {
        if record.tainted != self.taint {
            return Err(BlackboardError::TaintMismatch {
                record_tainted: record.tainted,
                table_tainted: self.taint,
            });
        }
        if !registry.is_kind(&record.kind) {
            return Err(BlackboardError::UnknownKind(record.kind.clone()));
        }
        let id = self.next_id;
        self.next_id += 1;
        record.id = Some(id);
        self.columns.entry(record.kind.clone()).or_default().push(id);
        self.by_id.insert(id, record);
        Ok(id)
    }

    /// Re-inserts a record that already carries an id, used when loading a
    /// saved snapshot. The table's `next_id` is advanced past it.
    fn add_with_id(&mut self, registry: &RecordRegistry, record: Record) -> Result<u64, BlackboardError> {
        if record.tainted != self.taint {
            return Err(BlackboardError::TaintMismatch {
                record_tainted: record.tainted,
                table_tainted: self.taint,
            });
        }
        if !registry.is_kind(&record.kind) {
            return Err(BlackboardError::UnknownKind(record.kind.clone()));
        }
        let id = record.id.unwrap_or(self.next_id);
        self.next_id = self.next_id.max(id + 1);
        self.columns.entry(record.kind.clone()).or_default().push(id);
        self.by_id.insert(id, record);
        Ok(id)
    }

    fn find_by_id(&self, id: u64) -> Option<&Record> {
        self.by_id.get(&id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Record> {
        self.by_id.get_mut(&id)
    }

    fn get_column(&self, registry: &RecordRegistry, kind: &str) -> Result<Vec<&Record>, BlackboardError> {
        if !registry.is_kind(kind) {
            return Err(BlackboardError::UnknownKind(kind.to_string()));
        }
        Ok(self
            .columns
            .get(kind)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .collect())
    }

    fn get_columns(&self, registry: &RecordRegistry, kinds: &[String]) -> Result<Vec<&Record>, BlackboardError> {
        let mut out = Vec::new();
        for kind in kinds {
            out.extend(self.get_column(registry, kind)?);
        }
        Ok(out)
    }

    fn remove(&mut self, id: u64) -> Option<Record> {
        let record = self.by_id.remove(&id)?;
        if let Some(ids) = self.columns.get_mut(&record.kind) {
            ids.retain(|&existing| existing != id);
        }
        Some(record)
    }

    fn all(&self) -> impl Iterator<Item = &Record> {
        self.by_id.values()
    }
}

/// Table of untainted records (§3.2).
#[derive(Debug)]
pub struct FactTable(RecordTable);

impl Default for FactTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FactTable {
    /// Creates an empty fact table.
    #[must_use]
    pub fn new() -> Self {
        Self(RecordTable::new(false))
    }

    /// Inserts `record`, assigning it a fresh id.
    ///
    /// # Errors
    /// See [`BlackboardError`].
    pub fn add(&mut self, registry: &RecordRegistry, record: Record) -> Result<u64, BlackboardError> {
        self.0.add(registry, record)
    }

    /// Inserts a record that already carries an id (used by `load`).
    ///
    /// # Errors
    /// See [`BlackboardError`].
    pub fn add_with_id(&mut self, registry: &RecordRegistry, record: Record) -> Result<u64, BlackboardError> {
        self.0.add_with_id(registry, record)
    }

    /// O(1) lookup by id.
    #[must_use]
    pub fn find_by_id(&self, id: u64) -> Option<&Record> {
        self.0.find_by_id(id)
    }

    /// Mutable lookup by id, used to rewrite provenance edges in place.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Record> {
        self.0.get_mut(id)
    }

    /// All facts of one kind, in insertion order.
    ///
    /// # Errors
    /// Returns an error if `kind` is not a registered record kind.
    pub fn get_column(&self, registry: &RecordRegistry, kind: &str) -> Result<Vec<&Record>, BlackboardError> {
        self.0.get_column(registry, kind)
    }

    /// All facts across several kinds, in per-kind insertion order.
    ///
    /// # Errors
    /// Returns an error if any `kind` is not a registered record kind.
    pub fn get_columns(&self, registry: &RecordRegistry, kinds: &[String]) -> Result<Vec<&Record>, BlackboardError> {
        self.0.get_columns(registry, kinds)
    }

    /// All facts, regardless of kind.
    pub fn all(&self) -> impl Iterator<Item = &Record> {
        self.0.all()
    }

    /// Number of facts stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.by_id.len()
    }

    /// True if no facts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.by_id.is_empty()
    }
}

/// Table of tainted records (§3.2). The only table that supports
/// [`HypothesisTable::remove`], used exclusively by promotion (§4.4.5).
#[derive(Debug)]
pub struct HypothesisTable(RecordTable);

impl Default for HypothesisTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HypothesisTable {
    /// Creates an empty hypothesis table.
    #[must_use]
    pub fn new() -> Self {
        Self(RecordTable::new(true))
    }

    /// Inserts `record`, assigning it a fresh id.
    ///
    /// # Errors
    /// See [`BlackboardError`].
    pub fn add(&mut self, registry: &RecordRegistry, record: Record) -> Result<u64, BlackboardError> {
        self.0.add(registry, record)
    }

    /// Inserts a record that already carries an id (used by `load`).
    ///
    /// # Errors
    /// See [`BlackboardError`].
    pub fn add_with_id(&mut self, registry: &RecordRegistry, record: Record) -> Result<u64, BlackboardError> {
        self.0.add_with_id(registry, record)
    }

    /// O(1) lookup by id.
    #[must_use]
    pub fn find_by_id(&self, id: u64) -> Option<&Record> {
        self.0.find_by_id(id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Record> {
        self.0.get_mut(id)
    }

    /// All hypotheses of one kind.
    ///
    /// # Errors
    /// Returns an error if `kind` is not a registered record kind.
    pub fn get_column(&self, registry: &RecordRegistry, kind: &str) -> Result<Vec<&Record>, BlackboardError> {
        self.0.get_column(registry, kind)
    }

    /// All hypotheses across several kinds.
    ///
    /// # Errors
    /// Returns an error if any `kind` is not a registered record kind.
    pub fn get_columns(&self, registry: &RecordRegistry, kinds: &[String]) -> Result<Vec<&Record>, BlackboardError> {
        self.0.get_columns(registry, kinds)
    }

    /// All hypotheses, regardless of kind.
    pub fn all(&self) -> impl Iterator<Item = &Record> {
        self.0.all()
    }

    /// Removes and returns the hypothesis with `id`, if present. The sole
    /// removal path in the blackboard; used by promotion.
    pub fn remove(&mut self, id: u64) -> Option<Record> {
        self.0.remove(id)
    }

    /// Number of hypotheses stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.by_id.len()
    }

    /// True if no hypotheses are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::BTreeMap as Map;
    use warden_facts::{FieldDescriptor, FieldType, FieldValue, RecordDescriptor};

    fn registry() -> RecordRegistry {
        let mut reg = RecordRegistry::new();
        reg.register(
            RecordDescriptor::new("md5").with_field(FieldDescriptor::required("hash", FieldType::String)),
        )
        .unwrap();
        reg
    }

    fn record(tainted: bool) -> Record {
        let reg = registry();
        let desc = reg.get("md5").unwrap();
        let mut fields = Map::new();
        fields.insert("hash".to_string(), FieldValue::Str("abc".to_string()));
        Record::new(desc, fields, "HashNPC", 0.0, tainted).unwrap()
    }

    #[test]
    fn fact_table_rejects_tainted_record() {
        let reg = registry();
        let mut table = FactTable::new();
        let err = table.add(&reg, record(true)).unwrap_err();
        assert_eq!(
            err,
            BlackboardError::TaintMismatch {
                record_tainted: true,
                table_tainted: false
            }
        );
    }

    #[test]
    fn hyp_table_rejects_untainted_record() {
        let reg = registry();
        let mut table = HypothesisTable::new();
        let err = table.add(&reg, record(false)).unwrap_err();
        assert_eq!(
            err,
            BlackboardError::TaintMismatch {
                record_tainted: false,
                table_tainted: true
            }
        );
    }

    #[test]
    fn ids_assigned_monotonically() {
        let reg = registry();
        let mut table = FactTable::new();
        let a = table.add(&reg, record(false)).unwrap();
        let b = table.add(&reg, record(false)).unwrap();
        assert_eq!((a, b), (0, 1));
    }

    #[test]
    fn find_by_id_is_available_after_insert() {
        let reg = registry();
        let mut table = FactTable::new();
        let id = table.add(&reg, record(false)).unwrap();
        assert!(table.find_by_id(id).is_some());
        assert!(table.find_by_id(id + 1).is_none());
    }

    #[test]
    fn promotion_removes_from_hyp_table_only() {
        let reg = registry();
        let mut hyps = HypothesisTable::new();
        let id = hyps.add(&reg, record(true)).unwrap();
        let removed = hyps.remove(id).unwrap();
        assert_eq!(removed.id, Some(id));
        assert!(hyps.find_by_id(id).is_none());
    }

    #[test]
    fn unknown_kind_column_lookup_errors() {
        let reg = registry();
        let table = FactTable::new();
        let err = table.get_column(&reg, "nonexistent").unwrap_err();
        assert_eq!(err, BlackboardError::UnknownKind("nonexistent".to_string()));
    }
}
