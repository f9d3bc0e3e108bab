// SPDX-License-Identifier: Apache-2.0
//! A fact inserted by one driver client is forwarded to a live fact
//! stream opened by another, but never echoed back to the inserter.

mod common;

use std::collections::BTreeMap;
use std::time::Duration;
use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor, RecordRegistry};
use warden_master::GameMaster;
use warden_registry::EngineRegistry;
use warden_rpc::{Command, CommandResult, EntityKind, StreamCommand, StreamItem};

fn observation() -> RecordDescriptor {
    RecordDescriptor::new("observation").with_field(FieldDescriptor::required("n", FieldType::Int))
}

fn record(descriptor: &RecordDescriptor, n: i64) -> Record {
    let mut fields = BTreeMap::new();
    fields.insert("n".to_string(), FieldValue::Int(n));
    Record::new(descriptor, fields, String::new(), 0.0, false).expect("valid record")
}

#[test]
fn fact_stream_sees_others_inserts_but_not_its_own() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut record_registry = RecordRegistry::new();
    record_registry.register(observation()).expect("register observation");

    let registry = EngineRegistry::new(common::engine_version());
    let engine_config = common::config(1, temp.path());
    let seed = Some(common::object_seed(Vec::new()));

    let mut game = GameMaster::build(registry, record_registry, engine_config, seed).expect("build game");
    game.start();

    let factory = game.client_factory();
    let subscriber = factory.create_client(EntityKind::Npc, 1, None);
    let inserter = factory.create_client(EntityKind::Npc, 2, None);

    let handle = subscriber
        .start_stream(StreamCommand::FactStream {
            kinds: vec!["observation".to_string()],
            only_latest: true,
        })
        .expect("open fact stream");

    let descriptor = observation();
    let result = inserter
        .send_and_wait(
            Command::AddFact {
                record: record(&descriptor, 1),
                as_hypothesis: false,
            },
            Some(Duration::from_secs(1)),
        )
        .expect("add fact");
    assert!(matches!(result, CommandResult::Id(0)));

    let StreamItem::Record(seen) = handle.recv(Some(Duration::from_secs(1))).expect("stream delivery") else {
        panic!("expected a record delivery");
    };
    assert_eq!(seen.kind, "observation");
    assert_eq!(seen.field("n"), Some(&FieldValue::Int(1)));

    let own_insert = subscriber
        .send_and_wait(
            Command::AddFact {
                record: record(&descriptor, 2),
                as_hypothesis: false,
            },
            Some(Duration::from_secs(1)),
        )
        .expect("add second fact");
    assert!(matches!(own_insert, CommandResult::Id(1)));

    // The subscriber just inserted n=2 itself; its own stream must not
    // echo it back (§4.4.3 step 4).
    let next = handle.recv(Some(Duration::from_millis(200)));
    assert!(next.is_err(), "inserting client must not receive its own fact");

    handle.stop().expect("stop stream");
    drop(inserter);
    drop(subscriber);
    game.join().expect("join");
}
