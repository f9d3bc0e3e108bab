// SPDX-License-Identifier: Apache-2.0
//! Back-story console: exempt from the parentage requirement, since
//! back-stories seed the game rather than derive from existing evidence
//! (§4.4.7, §6.1).

use crate::base::BaseConsole;
use std::path::PathBuf;
use warden_analyzer::{Console, ConsoleError, NewObjectArgs};
use warden_facts::Record;

/// Console handed to a back-story instance.
pub struct BackStoryConsole {
    base: BaseConsole,
}

impl BackStoryConsole {
    /// Wraps `base` as a back-story console.
    #[must_use]
    pub const fn new(base: BaseConsole) -> Self {
        Self { base }
    }
}

impl Console for BackStoryConsole {
    fn add_object(&self, args: NewObjectArgs) -> Result<u64, ConsoleError> {
        self.base.add_object(args)
    }

    fn add_fact(&self, fact: Record) -> Result<u64, ConsoleError> {
        self.base.add_record(fact, false, false)
    }

    fn add_hyp(&self, hyp: Record) -> Result<u64, ConsoleError> {
        self.base.add_record(hyp, true, false)
    }

    fn print(&self, message: &str) {
        self.base.print(message);
    }

    fn create_temp_directory(&self) -> Result<PathBuf, ConsoleError> {
        self.base.create_temp_directory()
    }
}
