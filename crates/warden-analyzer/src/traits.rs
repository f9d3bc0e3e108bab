// SPDX-License-Identifier: Apache-2.0
//! Analyzer kind contracts (§4.5, §4.6, §4.4.7, §4.7).

use crate::console::{Console, PlayerConsole};
use crate::error::AnalyzerError;
use warden_blackboard::BlackboardView;
use warden_facts::Record;

/// A player instance: handles exactly one fact or hypothesis delivery
/// before its clone is torn down (§4.5).
pub trait PlayerAnalyzer: Send {
    /// Handles an untainted fact delivery.
    ///
    /// # Errors
    /// Any failure is logged by the tracker and does not stop the engine.
    fn handle_fact(&mut self, console: &dyn PlayerConsole, fact: &Record) -> Result<(), AnalyzerError>;

    /// Handles a tainted hypothesis delivery.
    ///
    /// # Errors
    /// Any failure is logged by the tracker and does not stop the engine.
    fn handle_hypothesis(&mut self, console: &dyn PlayerConsole, hyp: &Record) -> Result<(), AnalyzerError>;
}

/// A singleton NPC instance: serially consumes objects from one queue
/// (§4.6).
pub trait NpcAnalyzer: Send {
    /// Handles one object delivery.
    ///
    /// # Errors
    /// Any failure is logged by the tracker and does not stop the engine.
    fn handle_data(&mut self, console: &dyn Console, object: &warden_blackboard::FileObject) -> Result<(), AnalyzerError>;
}

/// A back-story instance, tried in weight order within its category
/// (§4.4.7). A `true` return short-circuits the rest of the category for
/// that fact — the only analyzer return value the system consults.
pub trait BackStoryAnalyzer: Send {
    /// Handles one fact delivery.
    ///
    /// # Errors
    /// Any failure is logged by the tracker and does not stop the engine
    /// (and does not short-circuit the category — only `Ok(true)` does).
    fn handle_fact(&mut self, console: &dyn Console, fact: &Record) -> Result<bool, AnalyzerError>;
}

/// A read-only presentation module (§4.7). Screens never mutate the
/// blackboard; `view` borrows it immutably for the lifetime of the call.
pub trait ScreenAnalyzer: Send + Sync {
    /// Produces a structured snapshot.
    fn filter(&self, view: BlackboardView<'_>) -> serde_json::Value;

    /// Produces a serialised report.
    fn present(&self, view: BlackboardView<'_>) -> String;
}
