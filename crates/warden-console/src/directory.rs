// SPDX-License-Identifier: Apache-2.0
//! Per-entity temporary directory allocation (§6.1).

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use warden_analyzer::ConsoleError;

/// Hands out temporary directories under one entity's private base
/// directory, mirroring the source's per-player/per-npc scratch space
/// convention.
pub struct DirectoryHandler {
    base: PathBuf,
    my_dir: Mutex<Option<PathBuf>>,
}

impl DirectoryHandler {
    /// Creates (if absent) `root/{prefix}-{id}` as this entity's private
    /// base directory.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the directory could not be
    /// created.
    pub fn new(root: &Path, prefix: &str, id: u64) -> Result<Self, ConsoleError> {
        let base = root.join(format!("{prefix}-{id}"));
        std::fs::create_dir_all(&base).map_err(|e| ConsoleError::Remote(e.to_string()))?;
        Ok(Self {
            base,
            my_dir: Mutex::new(None),
        })
    }

    /// The entity's stable working directory (`base/tmp`), created
    /// lazily and reused across calls.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the directory could not be
    /// created.
    pub fn my_dir(&self) -> Result<PathBuf, ConsoleError> {
        let mut guard = self.my_dir.lock().map_err(|_| ConsoleError::Remote("directory lock poisoned".to_string()))?;
        if let Some(dir) = &*guard {
            return Ok(dir.clone());
        }
        let dir = self.base.join("tmp");
        std::fs::create_dir_all(&dir).map_err(|e| ConsoleError::Remote(e.to_string()))?;
        *guard = Some(dir.clone());
        Ok(dir)
    }

    /// Allocates a fresh, uniquely-named temporary directory under the
    /// entity's base directory.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the directory could not be
    /// created.
    pub fn temp_dir(&self) -> Result<PathBuf, ConsoleError> {
        tempfile::Builder::new()
            .prefix("tmp-")
            .tempdir_in(&self.base)
            .map(tempfile::TempDir::into_path)
            .map_err(|e| ConsoleError::Remote(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn my_dir_is_stable_across_calls() {
        let root = tempfile::tempdir().unwrap();
        let handler = DirectoryHandler::new(root.path(), "n", 3).unwrap();
        let first = handler.my_dir().unwrap();
        let second = handler.my_dir().unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn temp_dir_allocates_distinct_directories() {
        let root = tempfile::tempdir().unwrap();
        let handler = DirectoryHandler::new(root.path(), "p", 1).unwrap();
        let a = handler.temp_dir().unwrap();
        let b = handler.temp_dir().unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir());
        assert!(b.is_dir());
    }
}
