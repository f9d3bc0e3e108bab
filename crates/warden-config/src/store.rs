// SPDX-License-Identifier: Apache-2.0
//! Storage port for raw configuration blobs, and a typed service on top
//! of it (§10.3).

use crate::ConfigError;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;

/// Storage port for raw config blobs, keyed by logical name.
pub trait ConfigStore {
    /// Loads a raw config blob. Returns `NotFound` when missing.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the blob could not be read.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;

    /// Persists a raw config blob.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the blob could not be written.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Thin service that serializes config values and delegates storage to a
/// [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Creates a service backed by `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Consumes the service, returning the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Loads and deserializes a config value for `key`. Returns `Ok(None)`
    /// if missing or empty.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the stored bytes could not be read or
    /// deserialized.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Serializes and persists a config value for `key`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if serialization or the underlying write
    /// failed.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

/// Stores configs as JSON files under the platform config directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Creates a store rooted at the user config directory (e.g.
    /// `~/.config/Warden`).
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the platform config directory could
    /// not be resolved or created.
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "Warden")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir().to_path_buf())
    }

    /// Creates a store rooted at an explicit directory, creating it if
    /// necessary. Exists for tests and hosts that manage their own config
    /// root rather than the platform default.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if `base` could not be created.
    pub fn at(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Prefs {
        theme: String,
    }

    #[test]
    fn round_trips_through_fs_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().to_path_buf()).unwrap();
        let service = ConfigService::new(store);

        assert_eq!(service.load::<Prefs>("prefs").unwrap(), None);

        service
            .save(
                "prefs",
                &Prefs {
                    theme: "dark".to_string(),
                },
            )
            .unwrap();
        assert_eq!(
            service.load::<Prefs>("prefs").unwrap(),
            Some(Prefs {
                theme: "dark".to_string(),
            })
        );
    }

    #[test]
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().to_path_buf()).unwrap();
        assert!(matches!(store.load_raw("nope"), Err(ConfigError::NotFound)));
    }
}
