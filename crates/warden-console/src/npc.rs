// SPDX-License-Identifier: Apache-2.0
//! NPC console: full parentage requirements, no interests, singleton
//! per NPC kind (§4.6, §6.1).

use crate::base::BaseConsole;
use std::path::PathBuf;
use warden_analyzer::{Console, ConsoleError, NewObjectArgs};
use warden_facts::Record;

/// Console handed to an NPC instance.
pub struct NpcConsole {
    base: BaseConsole,
}

impl NpcConsole {
    /// Wraps `base` as an NPC console.
    #[must_use]
    pub const fn new(base: BaseConsole) -> Self {
        Self { base }
    }
}

impl Console for NpcConsole {
    fn add_object(&self, args: NewObjectArgs) -> Result<u64, ConsoleError> {
        self.base.add_object(args)
    }

    fn add_fact(&self, fact: Record) -> Result<u64, ConsoleError> {
        self.base.add_record(fact, false, true)
    }

    fn add_hyp(&self, hyp: Record) -> Result<u64, ConsoleError> {
        self.base.add_record(hyp, true, true)
    }

    fn print(&self, message: &str) {
        self.base.print(message);
    }

    fn create_temp_directory(&self) -> Result<PathBuf, ConsoleError> {
        self.base.create_temp_directory()
    }
}
