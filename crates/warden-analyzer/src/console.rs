// SPDX-License-Identifier: Apache-2.0
//! Analyzer-facing console trait contracts (§6.1).
//!
//! These traits describe the capability surface an analyzer instance is
//! handed at construction. Concrete implementations live in
//! `warden-console`, wired to the RPC fabric; analyzer code (and tests)
//! only ever sees these trait objects.

use crate::error::ConsoleError;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use warden_blackboard::FileObject;
use warden_facts::Record;

/// Arguments to [`Console::add_object`].
#[derive(Debug, Clone, Default)]
pub struct NewObjectArgs {
    /// Raw payload.
    pub data: Vec<u8>,
    /// Parent object ids.
    pub parent_objects: BTreeSet<u64>,
    /// Parent fact ids.
    pub parent_facts: BTreeSet<u64>,
    /// Parent hyp ids.
    pub parent_hyps: BTreeSet<u64>,
    /// Free-form metadata (`filename` is special-cased, §3.3).
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Text encoding hint.
    pub encoding: String,
}

/// Selects exactly one parent for a child-stream subscription (§6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSelector {
    /// Filter by parent object id.
    Object(u64),
    /// Filter by parent fact id.
    Fact(u64),
    /// Filter by parent hyp id.
    Hyp(u64),
}

/// Notified of a player clone's `running`/`waiting` transitions around
/// every blocking console call (`_waitOn`, §4.5). The tracker that spawned
/// the clone implements this to roll the transition into its liveness
/// aggregate; consoles built without a tracker behind them use
/// [`NoopPhaseSink`].
pub trait ClonePhaseSink: Send + Sync {
    /// The clone is about to block on a console call.
    fn set_waiting(&self);
    /// The clone resumed after a blocking console call returned.
    fn set_running(&self);
}

/// A [`ClonePhaseSink`] that discards every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPhaseSink;

impl ClonePhaseSink for NoopPhaseSink {
    fn set_waiting(&self) {}
    fn set_running(&self) {}
}

/// A cancellable, lazily-pulled sequence of records (`waitOnFacts` and
/// friends, §4.3, §9).
pub trait RecordStream: Send {
    /// Blocks for the next record, or until `timeout` elapses if given.
    ///
    /// # Errors
    /// Returns [`ConsoleError::StreamTimeout`] if a timeout was given and
    /// elapsed with nothing delivered.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Record, ConsoleError>;

    /// Cancels the stream (`stopStream`, §4.3).
    fn stop(self: Box<Self>);
}

/// A cancellable, lazily-pulled sequence of objects (`waitOnChildObjects`).
pub trait ObjectStream: Send {
    /// Blocks for the next object, or until `timeout` elapses if given.
    ///
    /// # Errors
    /// Returns [`ConsoleError::StreamTimeout`] if a timeout was given and
    /// elapsed with nothing delivered.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<FileObject, ConsoleError>;

    /// Cancels the stream.
    fn stop(self: Box<Self>);
}

/// Operations common to every entity kind (§6.1).
pub trait Console: Send {
    /// Adds a binary artifact, returning its id (the existing id, on a
    /// content-addressed duplicate).
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the coordinator rejects the call.
    fn add_object(&self, args: NewObjectArgs) -> Result<u64, ConsoleError>;

    /// Adds a fact. Player/NPC callers must supply at least one parent;
    /// back-story callers are exempt (enforced by the concrete console).
    ///
    /// # Errors
    /// Returns [`ConsoleError::ParentageRequired`] or [`ConsoleError::Remote`].
    fn add_fact(&self, fact: Record) -> Result<u64, ConsoleError>;

    /// Adds a hypothesis. Same parentage rule as [`Console::add_fact`],
    /// except for back-stories (which cannot emit hypotheses in practice
    /// since they have no tainted-clone concept, but the call is not
    /// itself restricted by entity kind here).
    ///
    /// # Errors
    /// Returns [`ConsoleError::ParentageRequired`] or [`ConsoleError::Remote`].
    fn add_hyp(&self, hyp: Record) -> Result<u64, ConsoleError>;

    /// Structured log via the coordinator; distinct from engine-internal
    /// diagnostic logging (§10.1).
    fn print(&self, message: &str);

    /// Allocates a private temporary directory for this entity.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if directory setup failed.
    fn create_temp_directory(&self) -> Result<PathBuf, ConsoleError>;
}

/// Operations available only to players (§6.1).
pub trait PlayerConsole: Console {
    /// Looks up an object by id.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_object(&self, id: u64) -> Result<Option<FileObject>, ConsoleError>;

    /// Returns every object currently on the blackboard.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_all_objects(&self) -> Result<Vec<FileObject>, ConsoleError>;

    /// Looks up a fact by id.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_fact(&self, id: u64) -> Result<Option<Record>, ConsoleError>;

    /// Returns every fact of the given kinds (group names are expanded).
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_all_facts(&self, kinds: &[String]) -> Result<Vec<Record>, ConsoleError>;

    /// Looks up a hypothesis by id.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_hyp(&self, id: u64) -> Result<Option<Record>, ConsoleError>;

    /// Returns every hypothesis of the given kinds (symmetric with
    /// [`PlayerConsole::get_all_facts`] — a dedicated command, not routed
    /// through the fact-collection handler, §9).
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] on a coordinator-side failure.
    fn get_all_hyps(&self, kinds: &[String]) -> Result<Vec<Record>, ConsoleError>;

    /// Blocks until a fact of one of `kinds` with id greater than
    /// `last_fact` exists, or `timeout` elapses (`timeout == None` waits
    /// forever).
    ///
    /// # Errors
    /// Returns [`ConsoleError::WaitTimeout`] if the timeout elapses first.
    fn wait_till_fact(
        &self,
        kinds: &[String],
        last_fact: Option<u64>,
        timeout: Option<Duration>,
    ) -> Result<Record, ConsoleError>;

    /// Subscribes to every new fact of the given kinds.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the subscription could not be
    /// established.
    fn wait_on_facts(&self, kinds: &[String], only_latest: bool) -> Result<Box<dyn RecordStream>, ConsoleError>;

    /// Subscribes to every new hypothesis of the given kinds.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the subscription could not be
    /// established.
    fn wait_on_hyps(&self, kinds: &[String], only_latest: bool) -> Result<Box<dyn RecordStream>, ConsoleError>;

    /// Subscribes to new facts whose parentage includes `parent`.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the subscription could not be
    /// established.
    fn wait_on_child_facts(
        &self,
        parent: ParentSelector,
        kinds: &[String],
        only_latest: bool,
    ) -> Result<Box<dyn RecordStream>, ConsoleError>;

    /// Subscribes to new hypotheses whose parentage includes `parent`.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the subscription could not be
    /// established.
    fn wait_on_child_hyps(
        &self,
        parent: ParentSelector,
        kinds: &[String],
        only_latest: bool,
    ) -> Result<Box<dyn RecordStream>, ConsoleError>;

    /// Subscribes to new objects whose parentage includes `parent`.
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the subscription could not be
    /// established.
    fn wait_on_child_objects(
        &self,
        parent: ParentSelector,
        only_latest: bool,
    ) -> Result<Box<dyn ObjectStream>, ConsoleError>;

    /// Promotes a hypothesis into a fact (§4.4.5).
    ///
    /// # Errors
    /// Returns [`ConsoleError::Remote`] if the hypothesis does not exist.
    fn promote(&self, hyp_id: u64) -> Result<Record, ConsoleError>;

    /// Adds a fact from a tainted (hypothesis-handling) clone; requires
    /// `yesreally = true` or the call is rejected (§6.1).
    ///
    /// # Errors
    /// Returns [`ConsoleError::YesReallyRequired`] if `yesreally` is false
    /// and this clone is tainted, or [`ConsoleError::ParentageRequired`].
    fn add_fact_tainted(&self, fact: Record, yesreally: bool) -> Result<u64, ConsoleError>;
}
