// SPDX-License-Identifier: Apache-2.0
//! The GameMaster coordinator (§4): the single dispatch thread that
//! wires the RPC fabric's command vocabulary to the shared blackboard,
//! spawns and reaps the player/NPC/back-story trackers, and drives
//! quiescence and save/restore.

mod coordinator;
mod error;
mod save;
mod seed;
mod state;
mod streams;
mod waiters;

pub use coordinator::GameMaster;
pub use error::MasterError;
pub use save::{check_engine_version, NamedMemorySnapshot, PlayerSnapshot, SaveState, SavedObject, VersionCompat};
pub use seed::{resolve_backstory_facts, BackStorySeedDocument, BackStorySeedFact, GameSeed};
pub use state::{Blackboard, ObjectInsert};
pub use streams::StreamRegistry;
pub use waiters::{PendingWait, WaitList};
