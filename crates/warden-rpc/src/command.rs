// SPDX-License-Identifier: Apache-2.0
//! Unary and streaming command vocabulary carried over the fabric (§4.3).

use std::collections::{BTreeMap, BTreeSet};
use warden_blackboard::FileObject;
use warden_facts::Record;

/// Arguments for [`Command::AddObject`].
#[derive(Debug, Clone, Default)]
pub struct AddObjectArgs {
    /// Raw payload.
    pub data: Vec<u8>,
    /// Parent object ids.
    pub parent_objects: BTreeSet<u64>,
    /// Parent fact ids.
    pub parent_facts: BTreeSet<u64>,
    /// Parent hyp ids.
    pub parent_hyps: BTreeSet<u64>,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Text encoding hint.
    pub encoding: String,
}

/// A selector narrowing a child stream to one parent (§6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSelector {
    /// Parent object id.
    Object(u64),
    /// Parent fact id.
    Fact(u64),
    /// Parent hyp id.
    Hyp(u64),
}

/// One unary request. Every variant maps 1:1 onto a handler the
/// coordinator registers at startup (§4.3).
#[derive(Debug, Clone)]
pub enum Command {
    /// Liveness ping; carries no data and is never logged at debug level
    /// above trace, matching the idle-detection heartbeat.
    Noop,
    /// Structured log message (§10.1).
    Print {
        /// Message body.
        message: String,
    },
    /// Adds a binary artifact.
    AddObject(AddObjectArgs),
    /// Adds a fact or (when `tainted` is set) a hypothesis written from a
    /// tainted clone with explicit override.
    AddFact {
        /// The record to insert.
        record: Record,
        /// True if inserting into the hypothesis table.
        as_hypothesis: bool,
    },
    /// Looks up an object by id.
    GetObject {
        /// Object id.
        id: u64,
    },
    /// Returns every object on the blackboard.
    GetAllObjects,
    /// Looks up a fact by id.
    GetFact {
        /// Fact id.
        id: u64,
    },
    /// Returns every fact whose kind is in `kinds` (already
    /// group-expanded by the caller's console).
    GetAllFacts {
        /// Requested fact kinds.
        kinds: Vec<String>,
    },
    /// Looks up a hypothesis by id.
    GetHyp {
        /// Hypothesis id.
        id: u64,
    },
    /// Returns every hypothesis whose kind is in `kinds`. A dedicated
    /// command, symmetric with [`Command::GetAllFacts`] (§9).
    GetAllHyps {
        /// Requested hypothesis kinds.
        kinds: Vec<String>,
    },
    /// Registers interest in the next fact of `kinds` newer than
    /// `last_fact`; answered immediately if one already exists, or
    /// queued and answered asynchronously otherwise (§4.4.4).
    WaitTillFact {
        /// Requested fact kinds.
        kinds: Vec<String>,
        /// Only facts with id greater than this are considered.
        last_fact: Option<u64>,
    },
    /// Promotes a hypothesis into a fact.
    Promote {
        /// Hypothesis id to promote.
        hyp_id: u64,
    },
    /// Allocates a private temporary directory for the caller.
    CreateTempDirectory,
}

/// Streaming subscription kinds (§4.3).
#[derive(Debug, Clone)]
pub enum StreamCommand {
    /// New facts of `kinds`.
    FactStream {
        /// Requested fact kinds.
        kinds: Vec<String>,
        /// Replay existing matches before streaming new ones is skipped
        /// when true.
        only_latest: bool,
    },
    /// New facts whose parentage includes `parent`.
    ChildFactStream {
        /// Parent selector.
        parent: ParentSelector,
        /// Requested fact kinds.
        kinds: Vec<String>,
        /// See [`StreamCommand::FactStream`].
        only_latest: bool,
    },
    /// New objects whose parentage includes `parent`.
    ChildObjectStream {
        /// Parent selector.
        parent: ParentSelector,
        /// See [`StreamCommand::FactStream`].
        only_latest: bool,
    },
    /// New hypotheses of `kinds`.
    HypStream {
        /// Requested hypothesis kinds.
        kinds: Vec<String>,
        /// See [`StreamCommand::FactStream`].
        only_latest: bool,
    },
    /// New hypotheses whose parentage includes `parent`.
    ChildHypStream {
        /// Parent selector.
        parent: ParentSelector,
        /// Requested hypothesis kinds.
        kinds: Vec<String>,
        /// See [`StreamCommand::FactStream`].
        only_latest: bool,
    },
}

/// Result payload carried in an ok [`crate::message::Response`].
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// No data.
    Unit,
    /// An id, as returned by add/promote operations.
    Id(u64),
    /// A single optional record.
    MaybeRecord(Option<Record>),
    /// Several records.
    Records(Vec<Record>),
    /// A single optional object.
    MaybeObject(Option<FileObject>),
    /// Several objects.
    Objects(Vec<FileObject>),
    /// A filesystem path.
    Path(std::path::PathBuf),
}

/// One item delivered on a stream.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A fact or hypothesis delivery.
    Record(Record),
    /// An object delivery.
    Object(FileObject),
}

/// Dispatch key for [`Command`] — handlers are registered per kind
/// rather than per concrete value (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// See [`Command::Noop`].
    Noop,
    /// See [`Command::Print`].
    Print,
    /// See [`Command::AddObject`].
    AddObject,
    /// See [`Command::AddFact`].
    AddFact,
    /// See [`Command::GetObject`].
    GetObject,
    /// See [`Command::GetAllObjects`].
    GetAllObjects,
    /// See [`Command::GetFact`].
    GetFact,
    /// See [`Command::GetAllFacts`].
    GetAllFacts,
    /// See [`Command::GetHyp`].
    GetHyp,
    /// See [`Command::GetAllHyps`].
    GetAllHyps,
    /// See [`Command::WaitTillFact`].
    WaitTillFact,
    /// See [`Command::Promote`].
    Promote,
    /// See [`Command::CreateTempDirectory`].
    CreateTempDirectory,
}

impl Command {
    /// Dispatch key for this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Noop => CommandKind::Noop,
            Self::Print { .. } => CommandKind::Print,
            Self::AddObject(_) => CommandKind::AddObject,
            Self::AddFact { .. } => CommandKind::AddFact,
            Self::GetObject { .. } => CommandKind::GetObject,
            Self::GetAllObjects => CommandKind::GetAllObjects,
            Self::GetFact { .. } => CommandKind::GetFact,
            Self::GetAllFacts { .. } => CommandKind::GetAllFacts,
            Self::GetHyp { .. } => CommandKind::GetHyp,
            Self::GetAllHyps { .. } => CommandKind::GetAllHyps,
            Self::WaitTillFact { .. } => CommandKind::WaitTillFact,
            Self::Promote { .. } => CommandKind::Promote,
            Self::CreateTempDirectory => CommandKind::CreateTempDirectory,
        }
    }
}

/// Dispatch key for [`StreamCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// See [`StreamCommand::FactStream`].
    FactStream,
    /// See [`StreamCommand::ChildFactStream`].
    ChildFactStream,
    /// See [`StreamCommand::ChildObjectStream`].
    ChildObjectStream,
    /// See [`StreamCommand::HypStream`].
    HypStream,
    /// See [`StreamCommand::ChildHypStream`].
    ChildHypStream,
}

impl StreamCommand {
    /// Dispatch key for this stream command.
    #[must_use]
    pub const fn kind(&self) -> StreamKind {
        match self {
            Self::FactStream { .. } => StreamKind::FactStream,
            Self::ChildFactStream { .. } => StreamKind::ChildFactStream,
            Self::ChildObjectStream { .. } => StreamKind::ChildObjectStream,
            Self::HypStream { .. } => StreamKind::HypStream,
            Self::ChildHypStream { .. } => StreamKind::ChildHypStream,
        }
    }
}
