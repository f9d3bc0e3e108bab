// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised while registering analyzer kinds (§4.1, §3.4).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A version string could not be parsed as semver (§10.5).
    #[error("could not parse version '{0}'")]
    InvalidVersion(String),
    /// The analyzer's `engine_version_required` exceeds the running
    /// engine's version.
    #[error("'{name}' requires engine version {required} but the running engine is {actual}")]
    EngineVersionTooNew {
        /// Analyzer display name.
        name: String,
        /// Version required by the analyzer.
        required: semver::Version,
        /// Version of the running engine.
        actual: semver::Version,
    },
    /// A player was registered twice under the same class identity
    /// (distinct from display-name collisions, which are warned and
    /// ignored for non-player kinds).
    #[error("player class '{0}' is already registered")]
    DuplicatePlayerClass(String),
}
