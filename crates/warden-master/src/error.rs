// SPDX-License-Identifier: Apache-2.0
//! Coordinator-level error type, composing every collaborator crate's
//! error into one enum (§10.2).

use warden_blackboard::BlackboardError;
use warden_config::ConfigError;
use warden_facts::FactsError;
use warden_registry::RegistryError;
use warden_rpc::RpcError;
use warden_screen::ScreenError;

/// Everything that can go wrong standing up or running a game.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// A blackboard insert/lookup violated a table invariant.
    #[error("blackboard error: {0}")]
    Blackboard(#[from] BlackboardError),
    /// A record failed validation against its declared schema.
    #[error("facts error: {0}")]
    Facts(#[from] FactsError),
    /// Registration was rejected (duplicate class identity, engine
    /// version mismatch, bad semver string).
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    /// Config load/save or option validation failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// The RPC fabric reported a transport-level failure.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    /// A screen failed to build against its declared option schema.
    #[error("screen error: {0}")]
    Screen(#[from] ScreenError),
    /// A tracker (player/NPC/back-story console or directory setup)
    /// failed outside the above categories.
    #[error("tracker setup failed: {0}")]
    TrackerSetup(String),
    /// Startup configuration was contradictory or incomplete.
    #[error("invalid game setup: {0}")]
    InvalidSetup(String),
    /// A save/restore snapshot was malformed or from an incompatible
    /// engine version.
    #[error("save/restore error: {0}")]
    SaveState(String),
}
