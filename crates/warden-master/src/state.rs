// SPDX-License-Identifier: Apache-2.0
//! Blackboard storage plus the reciprocal provenance-edge bookkeeping
//! that the three tables (`FactTable`/`HypothesisTable`/`ObjectList`)
//! do not maintain on their own (§3.1, §4.4.3, §4.4.5).

use std::collections::BTreeSet;
use warden_blackboard::{BlackboardError, FactTable, FileObject, HypothesisTable, NewObject, ObjectList};
use warden_facts::{Record, RecordRegistry};

/// Outcome of inserting an object: either a fresh id, or the id of the
/// object that already held this payload's hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectInsert {
    /// The object was new; dispatch it to interested NPCs.
    Inserted(u64),
    /// The payload was already present; do not re-dispatch.
    Duplicate(u64),
}

/// Owns the three blackboard tables and the schema they validate
/// against. The single writer is the coordinator's dispatch thread.
pub struct Blackboard {
    /// Record kind/group schema shared by facts and hypotheses.
    pub registry: RecordRegistry,
    /// Untainted records.
    pub facts: FactTable,
    /// Tainted records.
    pub hyps: HypothesisTable,
    /// Content-addressed binary artifacts.
    pub objects: ObjectList,
}

impl Blackboard {
    /// Creates an empty blackboard validating against `registry`.
    #[must_use]
    pub fn new(registry: RecordRegistry) -> Self {
        Self {
            registry,
            facts: FactTable::new(),
            hyps: HypothesisTable::new(),
            objects: ObjectList::new(),
        }
    }

    /// Inserts `new`, wiring reciprocal `child_objects` edges onto every
    /// parent object/fact/hyp that still exists. A hash collision is not
    /// an error here — the caller gets the existing id back and must not
    /// dispatch the object a second time (§3.3).
    ///
    /// # Errors
    /// Propagates any [`BlackboardError`] other than
    /// [`BlackboardError::DuplicateObject`].
    pub fn insert_object(&mut self, new: NewObject) -> Result<ObjectInsert, BlackboardError> {
        let parent_objects = new.parent_objects.clone();
        let parent_facts = new.parent_facts.clone();
        let parent_hyps = new.parent_hyps.clone();
        match self.objects.add(new) {
            Ok(id) => {
                self.link_children(&parent_objects, &parent_facts, &parent_hyps, |p| &mut p.child_objects, id);
                Ok(ObjectInsert::Inserted(id))
            }
            Err(BlackboardError::DuplicateObject { existing_id }) => Ok(ObjectInsert::Duplicate(existing_id)),
            Err(other) => Err(other),
        }
    }

    /// Inserts `record` into the fact table, wiring reciprocal
    /// `child_facts` edges onto every parent that still exists
    /// (§4.4.3 step 2).
    ///
    /// # Errors
    /// See [`FactTable::add`].
    pub fn insert_fact(&mut self, record: Record) -> Result<u64, BlackboardError> {
        let (parent_objects, parent_facts, parent_hyps) = parents_of(&record);
        let id = self.facts.add(&self.registry, record)?;
        self.link_children(&parent_objects, &parent_facts, &parent_hyps, |p| &mut p.child_facts, id);
        Ok(id)
    }

    /// Inserts `record` into the hypothesis table, wiring reciprocal
    /// `child_hyps` edges onto every parent that still exists.
    ///
    /// # Errors
    /// See [`HypothesisTable::add`].
    pub fn insert_hyp(&mut self, record: Record) -> Result<u64, BlackboardError> {
        let (parent_objects, parent_facts, parent_hyps) = parents_of(&record);
        let id = self.hyps.add(&self.registry, record)?;
        self.link_children(&parent_objects, &parent_facts, &parent_hyps, |p| &mut p.child_hyps, id);
        Ok(id)
    }

    fn link_children(
        &mut self,
        parent_objects: &BTreeSet<u64>,
        parent_facts: &BTreeSet<u64>,
        parent_hyps: &BTreeSet<u64>,
        mut edge: impl FnMut(&mut warden_facts::Provenance) -> &mut BTreeSet<u64>,
        child_id: u64,
    ) {
        for &pid in parent_objects {
            if let Some(obj) = self.objects.get_mut(pid) {
                edge(&mut obj.provenance).insert(child_id);
            }
        }
        for &pid in parent_facts {
            if let Some(fact) = self.facts.get_mut(pid) {
                edge(&mut fact.provenance).insert(child_id);
            }
        }
        for &pid in parent_hyps {
            if let Some(hyp) = self.hyps.get_mut(pid) {
                edge(&mut hyp.provenance).insert(child_id);
            }
        }
    }

    /// Promotes hypothesis `hyp_id` to a fact: removes it from the
    /// hypothesis table, untaints it, re-inserts it into the fact table
    /// under a freshly assigned id, and on every parent/child entity that
    /// still exists rewrites edges pointing at the old hyp id to point at
    /// the new fact id instead (§4.4.5). No stream or wait-list
    /// notification fires — promotion is not a synthetic insertion.
    ///
    /// Returns `None` if `hyp_id` does not exist.
    ///
    /// # Errors
    /// Propagates a [`BlackboardError`] if re-insertion into the fact
    /// table fails (the kind was registered when the hypothesis was
    /// created, so this should not normally happen).
    pub fn promote(&mut self, hyp_id: u64) -> Result<Option<u64>, BlackboardError> {
        let Some(mut record) = self.hyps.remove(hyp_id) else {
            return Ok(None);
        };
        record.untaint();
        let (parent_objects, parent_facts, parent_hyps) = parents_of(&record);
        let (child_objects, child_facts, child_hyps) = children_of(&record);

        let new_id = self.facts.add(&self.registry, record)?;

        for &pid in &parent_objects {
            if let Some(obj) = self.objects.get_mut(pid) {
                obj.provenance.child_hyps.remove(&hyp_id);
                obj.provenance.child_facts.insert(new_id);
            }
        }
        for &pid in &parent_facts {
            if let Some(fact) = self.facts.get_mut(pid) {
                fact.provenance.child_hyps.remove(&hyp_id);
                fact.provenance.child_facts.insert(new_id);
            }
        }
        for &pid in &parent_hyps {
            if let Some(hyp) = self.hyps.get_mut(pid) {
                hyp.provenance.child_hyps.remove(&hyp_id);
                hyp.provenance.child_facts.insert(new_id);
            }
        }
        for &cid in &child_objects {
            if let Some(obj) = self.objects.get_mut(cid) {
                obj.provenance.parent_hyps.remove(&hyp_id);
                obj.provenance.parent_facts.insert(new_id);
            }
        }
        for &cid in &child_facts {
            if let Some(fact) = self.facts.get_mut(cid) {
                fact.provenance.parent_hyps.remove(&hyp_id);
                fact.provenance.parent_facts.insert(new_id);
            }
        }
        for &cid in &child_hyps {
            if let Some(hyp) = self.hyps.get_mut(cid) {
                hyp.provenance.parent_hyps.remove(&hyp_id);
                hyp.provenance.parent_facts.insert(new_id);
            }
        }

        Ok(Some(new_id))
    }

    /// Re-inserts a fact carrying its original id, used when loading a
    /// saved snapshot (§4.4.8). Reciprocal edges are not recomputed —
    /// the snapshot already carries them on every record.
    ///
    /// # Errors
    /// See [`FactTable::add_with_id`].
    pub fn restore_fact(&mut self, record: Record) -> Result<u64, BlackboardError> {
        self.facts.add_with_id(&self.registry, record)
    }

    /// Re-inserts a hypothesis carrying its original id. See
    /// [`Blackboard::restore_fact`].
    ///
    /// # Errors
    /// See [`HypothesisTable::add_with_id`].
    pub fn restore_hyp(&mut self, record: Record) -> Result<u64, BlackboardError> {
        self.hyps.add_with_id(&self.registry, record)
    }

    /// Re-inserts an object carrying its original id and hash index.
    /// Used exclusively during snapshot load.
    pub fn restore_object(&mut self, object: FileObject) {
        self.objects.restore(object);
    }
}

fn parents_of(record: &Record) -> (BTreeSet<u64>, BTreeSet<u64>, BTreeSet<u64>) {
    (
        record.provenance.parent_objects.clone(),
        record.provenance.parent_facts.clone(),
        record.provenance.parent_hyps.clone(),
    )
}

fn children_of(record: &Record) -> (BTreeSet<u64>, BTreeSet<u64>, BTreeSet<u64>) {
    (
        record.provenance.child_objects.clone(),
        record.provenance.child_facts.clone(),
        record.provenance.child_hyps.clone(),
    )
}
