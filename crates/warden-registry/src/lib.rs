// SPDX-License-Identifier: Apache-2.0
//! Analyzer/screen metadata and the name-keyed catalogs the coordinator
//! consults at startup (§4.1, §3.4).

mod catalog;
mod error;
mod metadata;

pub use catalog::{Entry, IdentityPolicy, KindCatalog};
pub use error::RegistryError;
pub use metadata::{
    parse_version, AnalyzerMetadata, BackStoryMetadata, NpcMetadata, PlayerMetadata,
    ScreenMetadata, VersionGated,
};

use semver::Version;
use warden_analyzer::{BackStoryAnalyzer, NpcAnalyzer, PlayerAnalyzer, ScreenAnalyzer};

/// Builds a fresh player instance, or an error message on construction
/// failure.
pub type PlayerConstructor = Box<dyn Fn() -> Result<Box<dyn PlayerAnalyzer>, String> + Send + Sync>;
/// Builds a fresh NPC instance.
pub type NpcConstructor = Box<dyn Fn() -> Result<Box<dyn NpcAnalyzer>, String> + Send + Sync>;
/// Builds a fresh back-story instance.
pub type BackStoryConstructor = Box<dyn Fn() -> Result<Box<dyn BackStoryAnalyzer>, String> + Send + Sync>;
/// Builds a screen instance. Screens are stateless presenters, so one
/// instance is shared rather than rebuilt per call.
pub type ScreenConstructor = Box<dyn Fn() -> Result<Box<dyn ScreenAnalyzer>, String> + Send + Sync>;

/// All four analyzer/screen catalogs, keyed by the engine version the
/// running process reports (§3.4).
pub struct EngineRegistry {
    engine_version: Version,
    players: KindCatalog<PlayerMetadata, PlayerConstructor>,
    npcs: KindCatalog<NpcMetadata, NpcConstructor>,
    backstories: KindCatalog<BackStoryMetadata, BackStoryConstructor>,
    screens: KindCatalog<ScreenMetadata, ScreenConstructor>,
}

impl EngineRegistry {
    /// Creates an empty registry gated at `engine_version`.
    #[must_use]
    pub fn new(engine_version: Version) -> Self {
        Self {
            engine_version,
            players: KindCatalog::new(IdentityPolicy::ErrorOnDuplicate, "player"),
            npcs: KindCatalog::new(IdentityPolicy::WarnAndIgnore, "npc"),
            backstories: KindCatalog::new(IdentityPolicy::WarnAndIgnore, "backstory"),
            screens: KindCatalog::new(IdentityPolicy::WarnAndIgnore, "screen"),
        }
    }

    /// Engine version this registry gates registrations against.
    #[must_use]
    pub fn engine_version(&self) -> &Version {
        &self.engine_version
    }

    /// Registers a player kind.
    ///
    /// # Errors
    /// See [`KindCatalog::register`].
    pub fn register_player(
        &mut self,
        name: impl Into<String>,
        module_id: impl Into<String>,
        metadata: PlayerMetadata,
        constructor: PlayerConstructor,
    ) -> Result<bool, RegistryError> {
        self.players
            .register(name, module_id, metadata, constructor, &self.engine_version)
    }

    /// Registers an NPC kind.
    ///
    /// # Errors
    /// See [`KindCatalog::register`].
    pub fn register_npc(
        &mut self,
        name: impl Into<String>,
        module_id: impl Into<String>,
        metadata: NpcMetadata,
        constructor: NpcConstructor,
    ) -> Result<bool, RegistryError> {
        self.npcs
            .register(name, module_id, metadata, constructor, &self.engine_version)
    }

    /// Registers a back-story kind.
    ///
    /// # Errors
    /// See [`KindCatalog::register`].
    pub fn register_backstory(
        &mut self,
        name: impl Into<String>,
        module_id: impl Into<String>,
        metadata: BackStoryMetadata,
        constructor: BackStoryConstructor,
    ) -> Result<bool, RegistryError> {
        self.backstories
            .register(name, module_id, metadata, constructor, &self.engine_version)
    }

    /// Registers a screen kind.
    ///
    /// # Errors
    /// See [`KindCatalog::register`].
    pub fn register_screen(
        &mut self,
        name: impl Into<String>,
        module_id: impl Into<String>,
        metadata: ScreenMetadata,
        constructor: ScreenConstructor,
    ) -> Result<bool, RegistryError> {
        self.screens
            .register(name, module_id, metadata, constructor, &self.engine_version)
    }

    /// Registered player catalog.
    #[must_use]
    pub fn players(&self) -> &KindCatalog<PlayerMetadata, PlayerConstructor> {
        &self.players
    }

    /// Registered NPC catalog.
    #[must_use]
    pub fn npcs(&self) -> &KindCatalog<NpcMetadata, NpcConstructor> {
        &self.npcs
    }

    /// Registered back-story catalog.
    #[must_use]
    pub fn backstories(&self) -> &KindCatalog<BackStoryMetadata, BackStoryConstructor> {
        &self.backstories
    }

    /// Registered screen catalog.
    #[must_use]
    pub fn screens(&self) -> &KindCatalog<ScreenMetadata, ScreenConstructor> {
        &self.screens
    }

    /// Consumes the registry, handing ownership of all four catalogs to
    /// the caller. Used once at startup to build trackers/runners that
    /// outlive the registry itself.
    #[must_use]
    pub fn into_catalogs(
        self,
    ) -> (
        KindCatalog<PlayerMetadata, PlayerConstructor>,
        KindCatalog<NpcMetadata, NpcConstructor>,
        KindCatalog<BackStoryMetadata, BackStoryConstructor>,
        KindCatalog<ScreenMetadata, ScreenConstructor>,
    ) {
        (self.players, self.npcs, self.backstories, self.screens)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::BTreeSet;

    fn player_meta(required: &str) -> PlayerMetadata {
        PlayerMetadata {
            base: AnalyzerMetadata {
                name: "Sherlock".to_string(),
                description: "finds things".to_string(),
                creator: "tests".to_string(),
                version: Version::parse("1.0.0").unwrap(),
                engine_version_required: Version::parse(required).unwrap(),
                options_schema: warden_facts::RecordDescriptor::new("Sherlock"),
                help: None,
            },
            fact_interests: BTreeSet::from(["hash".to_string()]),
            hyp_interests: BTreeSet::new(),
        }
    }

    #[test]
    fn registers_player_and_rejects_duplicate_class() {
        let mut reg = EngineRegistry::new(Version::parse("2.0.0").unwrap());
        let ctor: PlayerConstructor = Box::new(|| Err("not built in this test".to_string()));
        reg.register_player("Sherlock", "sherlock.v1", player_meta("1.0.0"), ctor)
            .unwrap();
        assert_eq!(reg.players().len(), 1);

        let ctor2: PlayerConstructor = Box::new(|| Err("not built in this test".to_string()));
        let err = reg
            .register_player("SherlockAgain", "sherlock.v1", player_meta("1.0.0"), ctor2)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlayerClass(_)));
    }

    #[test]
    fn rejects_player_newer_than_engine() {
        let mut reg = EngineRegistry::new(Version::parse("1.0.0").unwrap());
        let ctor: PlayerConstructor = Box::new(|| Err("not built in this test".to_string()));
        let err = reg
            .register_player("Sherlock", "sherlock.v1", player_meta("9.9.9"), ctor)
            .unwrap_err();
        assert!(matches!(err, RegistryError::EngineVersionTooNew { .. }));
    }

    #[test]
    fn parse_version_rejects_non_semver() {
        assert!(parse_version("not-a-version").is_err());
        assert!(parse_version("1.2.3").is_ok());
    }
}
