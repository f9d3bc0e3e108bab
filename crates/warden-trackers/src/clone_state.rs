// SPDX-License-Identifier: Apache-2.0
//! Clone lifecycle state: `stopped -> running -> {waiting <-> running}* -> stopped`
//! (§4.5).

use std::sync::Mutex;
use warden_analyzer::ClonePhaseSink;

/// Where a player clone sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePhase {
    /// Not yet started, or its handler has returned/panicked.
    Stopped,
    /// Executing analyzer code.
    Running,
    /// Blocked inside a console call.
    Waiting,
}

/// Shared, thread-safe phase cell handed to a clone's console as a
/// [`ClonePhaseSink`], and read by the owning [`crate::PlayerTracker`]
/// for liveness aggregation.
#[derive(Debug)]
pub struct CloneState(Mutex<ClonePhase>);

impl CloneState {
    /// Starts in [`ClonePhase::Stopped`]; the spawning worker flips it to
    /// `Running` once the handler begins.
    #[must_use]
    pub fn new() -> Self {
        Self(Mutex::new(ClonePhase::Stopped))
    }

    /// Current phase.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned by an earlier panic.
    #[must_use]
    pub fn phase(&self) -> ClonePhase {
        *self.0.lock().expect("clone state lock poisoned")
    }

    /// Marks the clone as actively running analyzer code.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned by an earlier panic.
    pub fn set_running_now(&self) {
        *self.0.lock().expect("clone state lock poisoned") = ClonePhase::Running;
    }

    /// Marks the clone as stopped (terminal).
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned by an earlier panic.
    pub fn set_stopped(&self) {
        *self.0.lock().expect("clone state lock poisoned") = ClonePhase::Stopped;
    }
}

impl Default for CloneState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClonePhaseSink for CloneState {
    fn set_waiting(&self) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = ClonePhase::Waiting;
        }
    }

    fn set_running(&self) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = ClonePhase::Running;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn transitions_follow_sink_calls() {
        let state = CloneState::new();
        assert_eq!(state.phase(), ClonePhase::Stopped);
        state.set_running_now();
        assert_eq!(state.phase(), ClonePhase::Running);
        state.set_waiting();
        assert_eq!(state.phase(), ClonePhase::Waiting);
        state.set_running();
        assert_eq!(state.phase(), ClonePhase::Running);
        state.set_stopped();
        assert_eq!(state.phase(), ClonePhase::Stopped);
    }
}
