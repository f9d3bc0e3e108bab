// SPDX-License-Identifier: Apache-2.0
//! A player clone parked in [`warden_trackers::ClonePhase::Waiting`]
//! keeps the game alive only for its configured grace period, not
//! forever.

mod common;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use warden_analyzer::{AnalyzerError, Console, PlayerAnalyzer, PlayerConsole};
use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor, RecordRegistry};
use warden_master::GameMaster;
use warden_registry::{EngineRegistry, PlayerMetadata};
use warden_rpc::{Command, CommandResult, EntityKind};

fn trigger() -> RecordDescriptor {
    RecordDescriptor::new("trigger").with_field(FieldDescriptor::required("flag", FieldType::Bool))
}

/// Blocks forever on a fact kind that never arrives, parking its clone
/// in the waiting phase for the rest of the game.
struct StuckPlayer;

impl PlayerAnalyzer for StuckPlayer {
    fn handle_fact(&mut self, console: &dyn PlayerConsole, _fact: &Record) -> Result<(), AnalyzerError> {
        let _ = console.wait_till_fact(&["never".to_string()], None, None);
        Ok(())
    }
    fn handle_hypothesis(&mut self, _console: &dyn PlayerConsole, _hyp: &Record) -> Result<(), AnalyzerError> {
        Ok(())
    }
}

#[test]
fn join_returns_after_grace_time_not_immediately_and_not_forever() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut record_registry = RecordRegistry::new();
    record_registry.register(trigger()).expect("register trigger");

    let mut registry = EngineRegistry::new(common::engine_version());
    registry
        .register_player(
            "Stuck",
            "stuck.v1",
            PlayerMetadata {
                base: common::analyzer_metadata("Stuck", RecordDescriptor::new("Stuck")),
                fact_interests: std::collections::BTreeSet::from(["trigger".to_string()]),
                hyp_interests: std::collections::BTreeSet::new(),
            },
            Box::new(|| Ok(Box::new(StuckPlayer) as Box<dyn PlayerAnalyzer>)),
        )
        .expect("register player");

    let grace_time = 1;
    let engine_config = common::config(grace_time, temp.path());
    let mut game = GameMaster::build(registry, record_registry, engine_config, None).expect("build game");
    game.start();

    let factory = game.client_factory();
    let driver = factory.create_client(EntityKind::Npc, 1, None);
    let descriptor = trigger();
    let mut fields = BTreeMap::new();
    fields.insert("flag".to_string(), FieldValue::Bool(true));
    let record = Record::new(&descriptor, fields, String::new(), 0.0, false).expect("valid record");
    let result = driver
        .send_and_wait(
            Command::AddFact {
                record,
                as_hypothesis: false,
            },
            Some(Duration::from_secs(1)),
        )
        .expect("add trigger fact");
    assert!(matches!(result, CommandResult::Id(0)));
    drop(driver);

    let started = Instant::now();
    game.join().expect("join");
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_millis(900),
        "join returned before the grace period elapsed: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(5),
        "join outlasted the grace period by too much: {elapsed:?}"
    );
}
