// SPDX-License-Identifier: Apache-2.0
//! Promoting a hypothesis rewrites every neighbor's provenance edges to
//! point at the hypothesis's new fact-table id, in place of its old one.

mod common;

use std::collections::BTreeMap;
use std::time::Duration;
use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor, RecordRegistry};
use warden_master::GameMaster;
use warden_registry::EngineRegistry;
use warden_rpc::{Command, CommandResult, EntityKind};

fn lead() -> RecordDescriptor {
    RecordDescriptor::new("lead").with_field(FieldDescriptor::required("strength", FieldType::Int))
}

fn lead_record(descriptor: &RecordDescriptor, strength: i64, tainted: bool) -> Record {
    let mut fields = BTreeMap::new();
    fields.insert("strength".to_string(), FieldValue::Int(strength));
    Record::new(descriptor, fields, String::new(), 0.0, tainted).expect("valid record")
}

#[test]
fn promotion_rewrites_neighbor_provenance_to_the_new_id() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut record_registry = RecordRegistry::new();
    record_registry.register(lead()).expect("register lead");

    let registry = EngineRegistry::new(common::engine_version());
    let engine_config = common::config(1, temp.path());
    // The seed object always lands at object id 0.
    let seed = Some(common::object_seed(Vec::new()));

    let mut game = GameMaster::build(registry, record_registry, engine_config, seed).expect("build game");
    game.start();

    let factory = game.client_factory();
    let driver = factory.create_client(EntityKind::Npc, 1, None);
    let descriptor = lead();

    let mut hyp = lead_record(&descriptor, 5, true);
    hyp.provenance.parent_objects.insert(0);
    let hyp_id = match driver
        .send_and_wait(
            Command::AddFact {
                record: hyp,
                as_hypothesis: true,
            },
            Some(Duration::from_secs(1)),
        )
        .expect("insert hypothesis")
    {
        CommandResult::Id(id) => id,
        other => panic!("unexpected result: {other:?}"),
    };

    let mut dependent = lead_record(&descriptor, 9, false);
    dependent.provenance.parent_hyps.insert(hyp_id);
    let fact_id = match driver
        .send_and_wait(
            Command::AddFact {
                record: dependent,
                as_hypothesis: false,
            },
            Some(Duration::from_secs(1)),
        )
        .expect("insert dependent fact")
    {
        CommandResult::Id(id) => id,
        other => panic!("unexpected result: {other:?}"),
    };

    let promoted = match driver
        .send_and_wait(Command::Promote { hyp_id }, Some(Duration::from_secs(1)))
        .expect("promote")
    {
        CommandResult::MaybeRecord(Some(record)) => record,
        other => panic!("unexpected result: {other:?}"),
    };
    let promoted_id = promoted.id.expect("promoted record carries an id");
    assert_ne!(promoted_id, hyp_id);
    assert_eq!(promoted.provenance.parent_objects, std::collections::BTreeSet::from([0]));
    assert_eq!(promoted.provenance.child_facts, std::collections::BTreeSet::from([fact_id]));

    drop(driver);
    game.join().expect("join");
    let state = game.save();

    assert!(state.hyps.is_empty(), "promoted hypothesis must leave the hyp table");
    assert_eq!(state.facts.len(), 2);

    let dependent_after = state.facts.iter().find(|f| f.id == Some(fact_id)).expect("dependent fact present");
    assert!(dependent_after.provenance.parent_hyps.is_empty());
    assert_eq!(dependent_after.provenance.parent_facts, std::collections::BTreeSet::from([promoted_id]));

    let seed_object = state
        .objects
        .into_iter()
        .map(|saved| saved.into_object().expect("valid saved object"))
        .find(|object| object.id == 0)
        .expect("seed object present");
    assert!(!seed_object.provenance.child_hyps.contains(&hyp_id));
    assert!(seed_object.provenance.child_facts.contains(&promoted_id));
}
