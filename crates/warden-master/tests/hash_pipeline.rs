// SPDX-License-Identifier: Apache-2.0
//! An NPC turns a seeded object into a handful of hash facts, and a
//! player interested in the `hash` group receives every one of them.

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use warden_analyzer::{AnalyzerError, Console, PlayerAnalyzer, PlayerConsole};
use warden_blackboard::FileObject;
use warden_config::EngineConfig;
use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor, RecordRegistry};
use warden_master::GameMaster;
use warden_registry::{EngineRegistry, NpcMetadata, PlayerMetadata};

fn hash_descriptor(kind: &str) -> RecordDescriptor {
    RecordDescriptor::new(kind)
        .in_groups(["hash"])
        .with_field(FieldDescriptor::required("value", FieldType::String))
}

struct HashingNpc {
    descriptors: Vec<RecordDescriptor>,
}

impl warden_analyzer::NpcAnalyzer for HashingNpc {
    fn handle_data(&mut self, console: &dyn Console, object: &FileObject) -> Result<(), AnalyzerError> {
        for descriptor in &self.descriptors {
            let mut fields = BTreeMap::new();
            fields.insert("value".to_string(), FieldValue::Str(object.hash.to_string()));
            let mut fact = Record::new(descriptor, fields, String::new(), 0.0, false)
                .map_err(|e| AnalyzerError::Other(e.to_string()))?;
            fact.provenance.parent_objects.insert(object.id);
            console.add_fact(fact)?;
        }
        Ok(())
    }
}

struct CollectorPlayer(Arc<Mutex<Vec<Record>>>);

impl PlayerAnalyzer for CollectorPlayer {
    fn handle_fact(&mut self, _console: &dyn PlayerConsole, fact: &Record) -> Result<(), AnalyzerError> {
        self.0.lock().expect("log lock poisoned").push(fact.clone());
        Ok(())
    }
    fn handle_hypothesis(&mut self, _console: &dyn PlayerConsole, _hyp: &Record) -> Result<(), AnalyzerError> {
        Ok(())
    }
}

#[test]
fn npc_hashes_flow_to_interested_player() {
    let temp = tempfile::tempdir().expect("tempdir");
    let log: Arc<Mutex<Vec<Record>>> = Arc::new(Mutex::new(Vec::new()));

    let mut record_registry = RecordRegistry::new();
    record_registry.register(hash_descriptor("md5")).expect("register md5");
    record_registry.register(hash_descriptor("sha1")).expect("register sha1");

    let mut registry = EngineRegistry::new(common::engine_version());

    let descriptors = vec![hash_descriptor("md5"), hash_descriptor("sha1")];
    registry
        .register_npc(
            "Hasher",
            "hasher.v1",
            NpcMetadata {
                base: common::analyzer_metadata("Hasher", RecordDescriptor::new("Hasher")),
            },
            Box::new(move || {
                Ok(Box::new(HashingNpc {
                    descriptors: descriptors.clone(),
                }) as Box<dyn warden_analyzer::NpcAnalyzer>)
            }),
        )
        .expect("register npc");

    let log_for_player = Arc::clone(&log);
    registry
        .register_player(
            "Collector",
            "collector.v1",
            PlayerMetadata {
                base: common::analyzer_metadata("Collector", RecordDescriptor::new("Collector")),
                fact_interests: std::collections::BTreeSet::from(["hash".to_string()]),
                hyp_interests: std::collections::BTreeSet::new(),
            },
            Box::new(move || {
                Ok(Box::new(CollectorPlayer(Arc::clone(&log_for_player))) as Box<dyn PlayerAnalyzer>)
            }),
        )
        .expect("register player");

    let engine_config: EngineConfig = common::config(1, temp.path());
    let seed = Some(common::object_seed(vec![1, 2, 3, 4]));

    let mut game = GameMaster::build(registry, record_registry, engine_config, seed).expect("build game");
    game.start();
    game.join().expect("join");

    let state = game.save();
    let mut kinds: Vec<&str> = state.facts.iter().map(|fact| fact.kind.as_str()).collect();
    kinds.sort_unstable();
    assert_eq!(kinds, vec!["md5", "sha1"]);
    for fact in &state.facts {
        assert_eq!(fact.provenance.parent_objects, std::collections::BTreeSet::from([0]));
    }

    let seen = log.lock().expect("log lock poisoned");
    let mut seen_kinds: Vec<&str> = seen.iter().map(|fact| fact.kind.as_str()).collect();
    seen_kinds.sort_unstable();
    assert_eq!(seen_kinds, vec!["md5", "sha1"]);
}
