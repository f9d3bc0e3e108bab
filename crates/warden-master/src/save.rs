// SPDX-License-Identifier: Apache-2.0
//! Snapshot save/restore (§4.4.8, §6.3). `SaveState` is the serialisable
//! document; turning it back into a running blackboard and re-delivering
//! unseen facts is the coordinator's job (`coordinator::GameMaster::load`).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use warden_blackboard::{FileObject, ObjectHash};
use warden_facts::{Provenance, Record};

/// Stand-in for [`FileObject`] whose payload is base64-encoded, since
/// `FileObject`'s default derive would otherwise serialise `data` as a
/// JSON array of byte values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedObject {
    id: u64,
    hash: ObjectHash,
    size: usize,
    metadata: BTreeMap<String, serde_json::Value>,
    creator: String,
    created: f64,
    encoding: String,
    provenance: Provenance,
    data: String,
}

impl From<&FileObject> for SavedObject {
    fn from(object: &FileObject) -> Self {
        Self {
            id: object.id,
            hash: object.hash,
            size: object.size,
            metadata: object.metadata.clone(),
            creator: object.creator.clone(),
            created: object.created,
            encoding: object.encoding.clone(),
            provenance: object.provenance.clone(),
            data: BASE64.encode(&object.data),
        }
    }
}

impl SavedObject {
    /// Decodes this entry back into a [`FileObject`], ready for
    /// [`warden_master::state::Blackboard::restore_object`].
    ///
    /// # Errors
    /// Returns a description of the failure if `data` is not valid base64.
    pub fn into_object(self) -> Result<FileObject, String> {
        let data = BASE64.decode(self.data).map_err(|e| e.to_string())?;
        Ok(FileObject {
            id: self.id,
            data: Arc::from(data),
            hash: self.hash,
            size: self.size,
            metadata: self.metadata,
            creator: self.creator,
            created: self.created,
            encoding: self.encoding,
            provenance: self.provenance,
        })
    }
}

/// Saved state of one registered player kind (§4.4.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Display name, used to attach this snapshot to its tracker on load.
    pub name: String,
    /// Shared memory visible to every clone.
    pub memory: BTreeMap<String, serde_json::Value>,
    /// Per-clone memory, keyed by clone id.
    pub clone_memory: HashMap<u64, serde_json::Value>,
    /// Fact ids already delivered.
    pub seen_facts: BTreeSet<u64>,
    /// Hypothesis ids already delivered.
    pub seen_hyps: BTreeSet<u64>,
}

/// Saved state of one registered NPC/back-story: just its name and
/// shared memory (§4.4.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedMemorySnapshot {
    /// Display name, used to attach this snapshot on load.
    pub name: String,
    /// Shared memory visible to the tracker.
    pub memory: BTreeMap<String, serde_json::Value>,
}

/// A complete, serialisable game snapshot (§6.3). `engine_version` is
/// compared against the running process's version at load time: older
/// is a warning, newer is a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// Engine version the snapshot was produced under.
    pub engine_version: String,
    /// Root directory temporary per-entity directories were created under.
    pub temp_base: std::path::PathBuf,
    /// Every stored object.
    pub objects: Vec<SavedObject>,
    /// Every stored fact, id order.
    pub facts: Vec<Record>,
    /// Every stored hypothesis, id order.
    pub hyps: Vec<Record>,
    /// Per-player-kind snapshots.
    pub players: Vec<PlayerSnapshot>,
    /// Per-npc-kind snapshots.
    pub npcs: Vec<NamedMemorySnapshot>,
    /// Per-back-story snapshots.
    pub backstories: Vec<NamedMemorySnapshot>,
}

/// Compatibility outcome of comparing a loaded snapshot's engine version
/// against the running engine version (§4.4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCompat {
    /// Versions match exactly.
    Exact,
    /// The snapshot is older than the running engine; load proceeds
    /// with a warning.
    Older,
}

/// Compares a saved engine version against the running one.
///
/// # Errors
/// Returns a description of the failure if `saved` is newer than
/// `running`, or if either string fails to parse as semver.
pub fn check_engine_version(saved: &str, running: &semver::Version) -> Result<VersionCompat, String> {
    let saved_version = semver::Version::parse(saved).map_err(|e| format!("invalid saved engine version: {e}"))?;
    if &saved_version > running {
        return Err(format!("save file engine version {saved_version} is newer than running engine {running}"));
    }
    if &saved_version < running {
        Ok(VersionCompat::Older)
    } else {
        Ok(VersionCompat::Exact)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn roundtrips_object_payload_through_base64() {
        let object = FileObject {
            id: 3,
            data: Arc::from(vec![1_u8, 2, 3, 4]),
            hash: ObjectHash::of(&[1, 2, 3, 4]),
            size: 4,
            metadata: BTreeMap::new(),
            creator: "GameMaster".to_string(),
            created: 0.0,
            encoding: "utf-8".to_string(),
            provenance: Provenance::default(),
        };
        let saved = SavedObject::from(&object);
        let restored = saved.into_object().unwrap();
        assert_eq!(restored.data.as_ref(), object.data.as_ref());
        assert_eq!(restored.hash, object.hash);
        assert_eq!(restored.id, object.id);
    }

    #[test]
    fn older_saved_version_is_accepted_with_compat_flag() {
        let running = semver::Version::parse("2.0.0").unwrap();
        assert_eq!(check_engine_version("1.0.0", &running).unwrap(), VersionCompat::Older);
    }

    #[test]
    fn newer_saved_version_is_rejected() {
        let running = semver::Version::parse("1.0.0").unwrap();
        assert!(check_engine_version("2.0.0", &running).is_err());
    }

    #[test]
    fn matching_saved_version_is_exact() {
        let running = semver::Version::parse("1.2.3").unwrap();
        assert_eq!(check_engine_version("1.2.3", &running).unwrap(), VersionCompat::Exact);
    }
}
