// SPDX-License-Identifier: Apache-2.0
//! Trait contracts between the coordinator and analyzer instances: the
//! console capability surface (§6.1) and the four analyzer kinds
//! (player, NPC, back-story, screen — §4.5–§4.7).
//!
//! Concrete analyzer modules are an external collaborator (§1); this
//! crate only specifies what they are handed and what they must
//! implement.

mod console;
mod error;
mod traits;

pub use console::{
    ClonePhaseSink, Console, NewObjectArgs, NoopPhaseSink, ObjectStream, ParentSelector, PlayerConsole, RecordStream,
};
pub use error::{AnalyzerError, ConsoleError};
pub use traits::{BackStoryAnalyzer, NpcAnalyzer, PlayerAnalyzer, ScreenAnalyzer};
