// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised building or validating a screen (§4.7, §10.3).
#[derive(Debug, Error)]
pub enum ScreenError {
    /// The screen's constructor failed.
    #[error("could not construct screen '{name}': {reason}")]
    Creation {
        /// Screen display name.
        name: String,
        /// Failure reason reported by the constructor.
        reason: String,
    },
    /// The screen's option bag failed schema validation.
    #[error("option validation failed for screen '{name}': {source}")]
    InvalidOptions {
        /// Screen display name.
        name: String,
        /// Underlying validation failure.
        #[source]
        source: warden_config::ConfigError,
    },
}
