// SPDX-License-Identifier: Apache-2.0
//! Lifecycle trackers for the three clone-bearing analyzer kinds: player
//! clones (§4.5), the NPC worker (§4.6), and weight-ordered back-story
//! category dispatch (§4.4.7).
//!
//! The GameMaster coordinator owns one tracker per registered analyzer
//! (or, for back-stories, per category) and drives spawn/dispatch calls
//! from the RPC server's command handlers.

mod backstory_tracker;
mod clone_state;
mod npc_tracker;
mod player_tracker;

pub use backstory_tracker::{build_backstory_console, BackStoryCategoryTracker};
pub use clone_state::{ClonePhase, CloneState};
pub use npc_tracker::NpcTracker;
pub use player_tracker::PlayerTracker;
