// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised by the configuration store and the engine-level
/// configuration document (§7, §10.3).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in the store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// An option bag failed validation against its analyzer's declared
    /// schema.
    #[error("option validation failed: {0}")]
    Facts(#[from] warden_facts::FactsError),
    /// An entity name was asked for options but has no configured schema
    /// to validate against (§7 `ConfigNotFound`).
    #[error("no configured schema for '{0}'")]
    ConfigNotFound(String),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}
