// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

use std::path::Path;
use warden_config::EngineConfig;
use warden_facts::RecordDescriptor;
use warden_master::GameSeed;
use warden_registry::AnalyzerMetadata;

/// Engine version every fixture registry/analyzer is gated against.
pub fn engine_version() -> semver::Version {
    semver::Version::parse("1.0.0").unwrap()
}

/// A minimal `EngineConfig` with a private temp root and the given
/// grace period; everything else keeps its spec default.
pub fn config(grace_time: u64, temp_root: &Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.engine.grace_time = grace_time;
    config.engine.temporary = Some(temp_root.to_path_buf());
    config
}

/// Startup seed dispatching `data` to every registered NPC.
pub fn object_seed(data: Vec<u8>) -> GameSeed {
    GameSeed::Object { data, filename: None }
}

/// Common fields every test's analyzer metadata shares, parameterised
/// only by display name and declared option schema.
pub fn analyzer_metadata(name: &str, options_schema: RecordDescriptor) -> AnalyzerMetadata {
    AnalyzerMetadata {
        name: name.to_string(),
        description: String::new(),
        creator: "tests".to_string(),
        version: engine_version(),
        engine_version_required: engine_version(),
        options_schema,
        help: None,
    }
}
