// SPDX-License-Identifier: Apache-2.0
//! A seed fact dispatched to a back-story category runs handlers in
//! ascending weight order and stops at the first one that returns
//! `true`.

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use warden_analyzer::{AnalyzerError, BackStoryAnalyzer, Console};
use warden_config::OptionBag;
use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor, RecordRegistry};
use warden_master::{BackStorySeedDocument, BackStorySeedFact, GameMaster, GameSeed};
use warden_registry::{BackStoryMetadata, EngineRegistry};

fn seed_descriptor() -> RecordDescriptor {
    RecordDescriptor::new("seed").with_field(FieldDescriptor::required("n", FieldType::Int))
}

fn verdict_descriptor() -> RecordDescriptor {
    RecordDescriptor::new("verdict").with_field(FieldDescriptor::required("strength", FieldType::Int))
}

struct StoppingBackStory {
    log: Arc<Mutex<Vec<String>>>,
    name: String,
    verdict: RecordDescriptor,
}

impl BackStoryAnalyzer for StoppingBackStory {
    fn handle_fact(&mut self, console: &dyn Console, _fact: &Record) -> Result<bool, AnalyzerError> {
        self.log.lock().expect("log lock poisoned").push(self.name.clone());
        let mut fields = BTreeMap::new();
        fields.insert("strength".to_string(), FieldValue::Int(1));
        let record = Record::new(&self.verdict, fields, self.name.clone(), 0.0, false)
            .map_err(|e| AnalyzerError::Other(e.to_string()))?;
        console.add_fact(record)?;
        Ok(true)
    }
}

struct NeverReachedBackStory(Arc<Mutex<Vec<String>>>);

impl BackStoryAnalyzer for NeverReachedBackStory {
    fn handle_fact(&mut self, _console: &dyn Console, _fact: &Record) -> Result<bool, AnalyzerError> {
        self.0.lock().expect("log lock poisoned").push("should-not-run".to_string());
        Ok(false)
    }
}

fn backstory_metadata(name: &str, category: &str, weight: i64) -> BackStoryMetadata {
    BackStoryMetadata {
        base: common::analyzer_metadata(name, RecordDescriptor::new(name)),
        category: category.to_string(),
        default_weight: weight,
        interests: std::collections::BTreeSet::new(),
    }
}

#[test]
fn lowest_weight_handler_short_circuits_the_category() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut record_registry = RecordRegistry::new();
    record_registry.register(seed_descriptor()).expect("register seed");
    record_registry.register(verdict_descriptor()).expect("register verdict");

    let mut registry = EngineRegistry::new(common::engine_version());
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let log_a = Arc::clone(&log);
    registry
        .register_backstory(
            "Stopper",
            "stopper.v1",
            backstory_metadata("Stopper", "malware", 1),
            Box::new(move || {
                Ok(Box::new(StoppingBackStory {
                    log: Arc::clone(&log_a),
                    name: "Stopper".to_string(),
                    verdict: verdict_descriptor(),
                }) as Box<dyn BackStoryAnalyzer>)
            }),
        )
        .expect("register stopper");

    let log_b = Arc::clone(&log);
    registry
        .register_backstory(
            "NeverRun",
            "never-run.v1",
            backstory_metadata("NeverRun", "malware", 10),
            Box::new(move || Ok(Box::new(NeverReachedBackStory(Arc::clone(&log_b))) as Box<dyn BackStoryAnalyzer>)),
        )
        .expect("register never-run");

    let mut arguments = OptionBag::new();
    arguments.insert("n".to_string(), serde_json::json!(1));
    let seed = Some(GameSeed::BackStoryFacts(BackStorySeedDocument {
        facts: vec![BackStorySeedFact {
            name: "seed".to_string(),
            arguments,
        }],
    }));

    let engine_config = common::config(1, temp.path());
    let mut game = GameMaster::build(registry, record_registry, engine_config, seed).expect("build game");
    game.start();
    game.join().expect("join");

    let seen = log.lock().expect("log lock poisoned");
    assert_eq!(seen.as_slice(), &["Stopper".to_string()]);
    drop(seen);

    let state = game.save();
    assert_eq!(state.facts.len(), 1);
    assert_eq!(state.facts[0].kind, "verdict");
}
