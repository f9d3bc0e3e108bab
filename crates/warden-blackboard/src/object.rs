// SPDX-License-Identifier: Apache-2.0
//! Content-addressed object list (§3.3, §4.2).

use crate::hash::ObjectHash;
use crate::BlackboardError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use warden_facts::Provenance;

/// A binary artifact stored in the object list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// Monotonic id, independent of fact/hyp ids.
    pub id: u64,
    /// Raw payload.
    pub data: Arc<[u8]>,
    /// sha256 of `data`.
    pub hash: ObjectHash,
    /// Byte length of `data`.
    pub size: usize,
    /// Free-form metadata; `filename` is special-cased on insert (§3.3).
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Display name of the emitting analyzer instance, or `"GameMaster"`.
    pub creator: String,
    /// Wall-clock construction timestamp.
    pub created: f64,
    /// Text encoding hint for string-origin payloads.
    pub encoding: String,
    /// Parent/child provenance edges.
    pub provenance: Provenance,
}

/// Splits a `filename` metadata value into `(filename, filepath)` using
/// platform-agnostic rules: a leading `C:\`-style drive prefix is treated
/// as a Windows path, otherwise the path is treated as POSIX.
#[must_use]
pub fn split_filename_metadata(path: &str) -> (String, String) {
    let is_windows_path = path.len() >= 3
        && path.as_bytes()[0].is_ascii_alphabetic()
        && path.as_bytes()[1] == b':'
        && (path.as_bytes()[2] == b'\\' || path.as_bytes()[2] == b'/');

    let sep = if is_windows_path { '\\' } else { '/' };
    let normalized = if is_windows_path {
        path.replace('/', "\\")
    } else {
        path.to_string()
    };

    match normalized.rfind(sep) {
        Some(idx) => {
            let (parent, rest) = normalized.split_at(idx);
            let name = &rest[1..];
            let parent = if parent.is_empty() { sep.to_string() } else { parent.to_string() };
            (name.to_string(), parent)
        }
        None => (normalized, String::new()),
    }
}

/// Append-only, content-addressed store of [`FileObject`]s.
#[derive(Debug, Default)]
pub struct ObjectList {
    objects: Vec<FileObject>,
    by_hash: HashMap<ObjectHash, u64>,
}

/// Parameters for inserting a new object; mirrors the keyword arguments
/// accepted by `addObject` in the source.
#[derive(Debug, Default, Clone)]
pub struct NewObject {
    /// Raw payload.
    pub data: Vec<u8>,
    /// Display name of the emitting analyzer instance.
    pub creator: String,
    /// Parent object ids.
    pub parent_objects: BTreeSet<u64>,
    /// Parent fact ids.
    pub parent_facts: BTreeSet<u64>,
    /// Parent hyp ids.
    pub parent_hyps: BTreeSet<u64>,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Text encoding hint.
    pub encoding: String,
}

impl ObjectList {
    /// Creates an empty object list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Looks up an object by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&FileObject> {
        self.objects.get(usize::try_from(id).ok()?)
    }

    /// Looks up an object by id, mutably.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut FileObject> {
        self.objects.get_mut(usize::try_from(id).ok()?)
    }

    /// All stored objects, in insertion order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &FileObject> {
        self.objects.iter()
    }

    /// Looks up an object id by the hash of its data.
    #[must_use]
    pub fn id_by_hash(&self, hash: ObjectHash) -> Option<u64> {
        self.by_hash.get(&hash).copied()
    }

    /// Re-inserts an object that already carries its original id and
    /// hash, used when loading a saved snapshot. Callers must restore in
    /// ascending id order; this does not renumber or re-split metadata.
    pub fn restore(&mut self, object: FileObject) {
        self.by_hash.insert(object.hash, object.id);
        self.objects.push(object);
    }

    /// Inserts a new object.
    ///
    /// `metadata.filename`, if present as a string, is split into
    /// `filename`/`filepath` entries (§3.3).
    ///
    /// # Errors
    /// Returns [`BlackboardError::DuplicateObject`] carrying the existing
    /// object's real id if `data`'s hash is already present. The caller
    /// must not re-dispatch the object in that case, and must use the
    /// returned id — never a freshly allocated one that was never stored.
    pub fn add(&mut self, mut new: NewObject) -> Result<u64, BlackboardError> {
        let hash = ObjectHash::of(&new.data);
        if let Some(&existing_id) = self.by_hash.get(&hash) {
            return Err(BlackboardError::DuplicateObject { existing_id });
        }

        if let Some(serde_json::Value::String(filename)) = new.metadata.get("filename").cloned() {
            let (name, parent) = split_filename_metadata(&filename);
            new.metadata
                .insert("filename".to_string(), serde_json::Value::String(name));
            new.metadata
                .insert("filepath".to_string(), serde_json::Value::String(parent));
        }

        let id = u64::try_from(self.objects.len()).unwrap_or(u64::MAX);
        let size = new.data.len();
        let object = FileObject {
            id,
            data: Arc::from(new.data),
            hash,
            size,
            metadata: new.metadata,
            creator: new.creator,
            created: 0.0,
            encoding: if new.encoding.is_empty() {
                "utf-8".to_string()
            } else {
                new.encoding
            },
            provenance: Provenance {
                parent_objects: new.parent_objects,
                parent_facts: new.parent_facts,
                parent_hyps: new.parent_hyps,
                ..Provenance::default()
            },
        };
        self.by_hash.insert(hash, id);
        self.objects.push(object);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn obj(data: &[u8]) -> NewObject {
        NewObject {
            data: data.to_vec(),
            creator: "GameMaster".to_string(),
            ..NewObject::default()
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut list = ObjectList::new();
        let a = list.add(obj(b"one")).unwrap();
        let b = list.add(obj(b"two")).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn duplicate_returns_existing_real_id_not_a_fresh_one() {
        let mut list = ObjectList::new();
        let first = list.add(obj(b"dup")).unwrap();
        assert_eq!(first, 0);
        let err = list.add(obj(b"dup")).unwrap_err();
        assert_eq!(err, BlackboardError::DuplicateObject { existing_id: 0 });
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn filename_metadata_split_posix() {
        let (name, parent) = split_filename_metadata("/tmp/evidence/sample.bin");
        assert_eq!(name, "sample.bin");
        assert_eq!(parent, "/tmp/evidence");
    }

    #[test]
    fn filename_metadata_split_windows() {
        let (name, parent) = split_filename_metadata(r"C:\Users\analyst\sample.bin");
        assert_eq!(name, "sample.bin");
        assert_eq!(parent, r"C:\Users\analyst");
    }

    #[test]
    fn restore_preserves_original_id_and_hash_index() {
        let mut list = ObjectList::new();
        let saved = FileObject {
            id: 5,
            data: Arc::from(vec![9_u8, 9]),
            hash: ObjectHash::of(&[9, 9]),
            size: 2,
            metadata: BTreeMap::new(),
            creator: "GameMaster".to_string(),
            created: 0.0,
            encoding: "utf-8".to_string(),
            provenance: Provenance::default(),
        };
        let hash = saved.hash;
        list.restore(saved);
        assert_eq!(list.id_by_hash(hash), Some(5));
        assert_eq!(list.get(5).unwrap().id, 5);
    }

    #[test]
    fn add_splits_filename_metadata() {
        let mut list = ObjectList::new();
        let mut new = obj(b"payload");
        new.metadata.insert(
            "filename".to_string(),
            serde_json::Value::String("/a/b/c.bin".to_string()),
        );
        let id = list.add(new).unwrap();
        let stored = list.get(id).unwrap();
        assert_eq!(stored.metadata["filename"], serde_json::json!("c.bin"));
        assert_eq!(stored.metadata["filepath"], serde_json::json!("/a/b"));
    }
}
