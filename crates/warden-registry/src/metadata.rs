// SPDX-License-Identifier: Apache-2.0
//! Analyzer metadata (§3.4).

use crate::RegistryError;
use semver::Version;
use std::collections::BTreeSet;
use warden_facts::RecordDescriptor;

/// Parses a version string, surfacing a registration error on failure
/// rather than silently accepting an unparseable one (§10.5).
///
/// # Errors
/// Returns [`RegistryError::InvalidVersion`] if `raw` is not valid semver.
pub fn parse_version(raw: &str) -> Result<Version, RegistryError> {
    Version::parse(raw).map_err(|_| RegistryError::InvalidVersion(raw.to_string()))
}

/// Metadata common to every analyzer kind.
#[derive(Debug, Clone)]
pub struct AnalyzerMetadata {
    /// Display name, unique per kind (players additionally key on class
    /// identity — see [`crate::catalog::KindCatalog`]).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Author/maintainer display name.
    pub creator: String,
    /// Analyzer version.
    pub version: Version,
    /// Minimum engine version the analyzer requires.
    pub engine_version_required: Version,
    /// Declared shape of this analyzer's configuration option bag,
    /// validated with the same field-descriptor machinery as fact/hyp
    /// records (§3.1, §9, §10.3). An empty descriptor accepts no options.
    pub options_schema: RecordDescriptor,
    /// Optional help text.
    pub help: Option<String>,
}

/// Player metadata: interests in addition to the common fields (§3.4).
#[derive(Debug, Clone)]
pub struct PlayerMetadata {
    /// Common fields.
    pub base: AnalyzerMetadata,
    /// Fact kinds/groups this player consumes.
    pub fact_interests: BTreeSet<String>,
    /// Hypothesis kinds/groups this player consumes.
    pub hyp_interests: BTreeSet<String>,
}

/// NPC metadata: just the common fields — NPCs receive every object
/// unconditionally (§4.4.2), so there is no interest set to declare.
#[derive(Debug, Clone)]
pub struct NpcMetadata {
    /// Common fields.
    pub base: AnalyzerMetadata,
}

/// Back-story metadata: category and weight in addition to the common
/// fields (§3.4, §4.4.7).
#[derive(Debug, Clone)]
pub struct BackStoryMetadata {
    /// Common fields.
    pub base: AnalyzerMetadata,
    /// Category name; back-stories in the same category are dispatched
    /// through one weight-ordered queue.
    pub category: String,
    /// Default dispatch weight (lower runs first).
    pub default_weight: i64,
    /// Fact kinds/groups this back-story consumes.
    pub interests: BTreeSet<String>,
}

/// Screen metadata: simpler than the analyzer kinds — no interests, no
/// parentage rules.
#[derive(Debug, Clone)]
pub struct ScreenMetadata {
    /// Display name.
    pub name: String,
    /// Screen version.
    pub version: Version,
    /// Minimum engine version the screen requires.
    pub engine_version_required: Version,
    /// Declared shape of this screen's configuration option bag.
    pub options_schema: RecordDescriptor,
}

/// Gives [`crate::catalog::KindCatalog`] a uniform way to read the
/// engine-version floor out of any metadata shape (§3.4).
pub trait VersionGated {
    /// Minimum engine version this entry requires.
    fn engine_version_required(&self) -> &Version;
}

impl VersionGated for AnalyzerMetadata {
    fn engine_version_required(&self) -> &Version {
        &self.engine_version_required
    }
}

impl VersionGated for PlayerMetadata {
    fn engine_version_required(&self) -> &Version {
        &self.base.engine_version_required
    }
}

impl VersionGated for NpcMetadata {
    fn engine_version_required(&self) -> &Version {
        &self.base.engine_version_required
    }
}

impl VersionGated for BackStoryMetadata {
    fn engine_version_required(&self) -> &Version {
        &self.base.engine_version_required
    }
}

impl VersionGated for ScreenMetadata {
    fn engine_version_required(&self) -> &Version {
        &self.engine_version_required
    }
}
