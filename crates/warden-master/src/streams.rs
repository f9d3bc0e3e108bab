// SPDX-License-Identifier: Apache-2.0
//! Live stream subscriptions: fact/hyp/object deliveries pushed to
//! whoever opened a [`StreamCommand`] (§4.3, §6.1). Registered and
//! consulted only from the coordinator's single dispatch thread, so no
//! locking is needed here beyond what the caller already holds.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::Sender;
use warden_blackboard::FileObject;
use warden_facts::Record;
use warden_rpc::{Entity, ParentSelector, RequestId, StreamItem};

struct RecordSubscriber {
    owner: Entity,
    kinds: BTreeSet<String>,
    tx: Sender<StreamItem>,
}

struct ChildRecordSubscriber {
    owner: Entity,
    parent: ParentSelector,
    kinds: BTreeSet<String>,
    tx: Sender<StreamItem>,
}

struct ChildObjectSubscriber {
    owner: Entity,
    parent: ParentSelector,
    tx: Sender<StreamItem>,
}

/// All five stream-kind subscriber tables, keyed by the request id that
/// opened them (also the id a later `StopStream` names).
#[derive(Default)]
pub struct StreamRegistry {
    fact_streams: BTreeMap<RequestId, RecordSubscriber>,
    child_fact_streams: BTreeMap<RequestId, ChildRecordSubscriber>,
    child_object_streams: BTreeMap<RequestId, ChildObjectSubscriber>,
    hyp_streams: BTreeMap<RequestId, RecordSubscriber>,
    child_hyp_streams: BTreeMap<RequestId, ChildRecordSubscriber>,
}

pub(crate) fn selects(selector: ParentSelector, provenance: &warden_facts::Provenance) -> bool {
    match selector {
        ParentSelector::Object(id) => provenance.parent_objects.contains(&id),
        ParentSelector::Fact(id) => provenance.parent_facts.contains(&id),
        ParentSelector::Hyp(id) => provenance.parent_hyps.contains(&id),
    }
}

impl StreamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fact-stream subscriber.
    pub fn add_fact_stream(&mut self, id: RequestId, owner: Entity, kinds: BTreeSet<String>, tx: Sender<StreamItem>) {
        self.fact_streams.insert(id, RecordSubscriber { owner, kinds, tx });
    }

    /// Registers a child-fact-stream subscriber.
    pub fn add_child_fact_stream(&mut self, id: RequestId, owner: Entity, parent: ParentSelector, kinds: BTreeSet<String>, tx: Sender<StreamItem>) {
        self.child_fact_streams.insert(id, ChildRecordSubscriber { owner, parent, kinds, tx });
    }

    /// Registers a child-object-stream subscriber.
    pub fn add_child_object_stream(&mut self, id: RequestId, owner: Entity, parent: ParentSelector, tx: Sender<StreamItem>) {
        self.child_object_streams.insert(id, ChildObjectSubscriber { owner, parent, tx });
    }

    /// Registers a hyp-stream subscriber.
    pub fn add_hyp_stream(&mut self, id: RequestId, owner: Entity, kinds: BTreeSet<String>, tx: Sender<StreamItem>) {
        self.hyp_streams.insert(id, RecordSubscriber { owner, kinds, tx });
    }

    /// Registers a child-hyp-stream subscriber.
    pub fn add_child_hyp_stream(&mut self, id: RequestId, owner: Entity, parent: ParentSelector, kinds: BTreeSet<String>, tx: Sender<StreamItem>) {
        self.child_hyp_streams.insert(id, ChildRecordSubscriber { owner, parent, kinds, tx });
    }

    /// Drops every subscriber table entry for `id`, regardless of kind.
    pub fn remove(&mut self, id: RequestId) {
        self.fact_streams.remove(&id);
        self.child_fact_streams.remove(&id);
        self.child_object_streams.remove(&id);
        self.hyp_streams.remove(&id);
        self.child_hyp_streams.remove(&id);
    }

    /// Forwards `fact` to every matching fact/child-fact subscriber other
    /// than `inserting` itself (§4.4.3 step 4: do not deliver to the
    /// sender).
    pub fn notify_fact(&mut self, fact: &Record, inserting: Entity) {
        self.fact_streams.retain(|_, sub| {
            if sub.owner != inserting && sub.kinds.contains(&fact.kind) {
                sub.tx.send(StreamItem::Record(fact.clone())).is_ok()
            } else {
                true
            }
        });
        self.child_fact_streams.retain(|_, sub| {
            if sub.owner != inserting && sub.kinds.contains(&fact.kind) && selects(sub.parent, &fact.provenance) {
                sub.tx.send(StreamItem::Record(fact.clone())).is_ok()
            } else {
                true
            }
        });
    }

    /// Forwards `hyp` to every matching hyp/child-hyp subscriber other
    /// than `inserting`.
    pub fn notify_hyp(&mut self, hyp: &Record, inserting: Entity) {
        self.hyp_streams.retain(|_, sub| {
            if sub.owner != inserting && sub.kinds.contains(&hyp.kind) {
                sub.tx.send(StreamItem::Record(hyp.clone())).is_ok()
            } else {
                true
            }
        });
        self.child_hyp_streams.retain(|_, sub| {
            if sub.owner != inserting && sub.kinds.contains(&hyp.kind) && selects(sub.parent, &hyp.provenance) {
                sub.tx.send(StreamItem::Record(hyp.clone())).is_ok()
            } else {
                true
            }
        });
    }

    /// Forwards `object` to every matching child-object subscriber other
    /// than `inserting`.
    pub fn notify_object(&mut self, object: &FileObject, inserting: Entity) {
        self.child_object_streams.retain(|_, sub| {
            if sub.owner != inserting && selects(sub.parent, &object.provenance) {
                sub.tx.send(StreamItem::Object(object.clone())).is_ok()
            } else {
                true
            }
        });
    }
}
