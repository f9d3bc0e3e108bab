// SPDX-License-Identifier: Apache-2.0
//! Entity identity carried on every request (§3.1).

use std::fmt;

/// The three clone-bearing participant kinds the coordinator spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A singleton NPC instance.
    Npc,
    /// A per-delivery player clone.
    Player,
    /// A singleton back-story instance.
    BackStory,
}

/// Identifies the analyzer instance a request originated from.
///
/// `clone_id` distinguishes concurrently-live player clones handling
/// different facts/hypotheses for the same player kind; NPCs and
/// back-stories are singletons and always carry `clone_id: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Which RPC client this entity is attached to.
    pub client_id: u64,
    /// Participant kind.
    pub kind: EntityKind,
    /// Tracker-assigned id within its kind.
    pub id: u64,
    /// Clone id, populated only for players.
    pub clone_id: Option<u64>,
}

impl Entity {
    /// Constructs an entity identity.
    #[must_use]
    pub const fn new(client_id: u64, kind: EntityKind, id: u64, clone_id: Option<u64>) -> Self {
        Self {
            client_id,
            kind,
            id,
            clone_id,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.clone_id) {
            (EntityKind::Npc, _) => write!(f, "npc-{}", self.id),
            (EntityKind::Player, Some(clone)) => write!(f, "player-{}-clone-{clone}", self.id),
            (EntityKind::Player, None) => write!(f, "player-{}", self.id),
            (EntityKind::BackStory, _) => write!(f, "backstory-{}", self.id),
        }
    }
}
