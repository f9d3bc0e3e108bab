// SPDX-License-Identifier: Apache-2.0
//! Shared plumbing behind every concrete [`Console`](warden_analyzer::Console)
//! implementation (§6.1).

use crate::directory::DirectoryHandler;
use std::path::PathBuf;
use std::time::Duration;
use warden_analyzer::{ConsoleError, NewObjectArgs};
use warden_facts::Record;
use warden_rpc::{AddObjectArgs, Command, CommandResult, RpcClient, RpcError};

/// Default budget for a unary round-trip before it is treated as a
/// coordinator-side hang.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn to_console_error(err: RpcError) -> ConsoleError {
    match err {
        RpcError::Timeout => ConsoleError::WaitTimeout,
        RpcError::StreamTimeout => ConsoleError::StreamTimeout,
        RpcError::Handler(reason) => ConsoleError::Remote(reason),
        other => ConsoleError::Remote(other.to_string()),
    }
}

pub(crate) fn record_parentage_is_empty(record: &Record) -> bool {
    record.provenance.parent_objects.is_empty()
        && record.provenance.parent_facts.is_empty()
        && record.provenance.parent_hyps.is_empty()
}

/// Bundles the RPC handle and scratch-directory allocator every console
/// kind wraps.
pub struct BaseConsole {
    pub(crate) rpc: RpcClient,
    pub(crate) directory: DirectoryHandler,
    pub(crate) creator: String,
}

impl BaseConsole {
    /// Wraps an RPC client for `creator` (the display name attributed to
    /// records this console emits) with its private directory handler.
    #[must_use]
    pub const fn new(rpc: RpcClient, directory: DirectoryHandler, creator: String) -> Self {
        Self { rpc, directory, creator }
    }

    pub(crate) fn add_object(&self, args: NewObjectArgs) -> Result<u64, ConsoleError> {
        let result = self
            .rpc
            .send_and_wait(
                Command::AddObject(AddObjectArgs {
                    data: args.data,
                    parent_objects: args.parent_objects,
                    parent_facts: args.parent_facts,
                    parent_hyps: args.parent_hyps,
                    metadata: args.metadata,
                    encoding: args.encoding,
                }),
                Some(DEFAULT_TIMEOUT),
            )
            .map_err(to_console_error)?;
        match result {
            CommandResult::Id(id) => Ok(id),
            _ => Err(ConsoleError::Remote("malformed addObject response".to_string())),
        }
    }

    pub(crate) fn add_record(&self, mut record: Record, as_hypothesis: bool, require_parentage: bool) -> Result<u64, ConsoleError> {
        if require_parentage && record_parentage_is_empty(&record) {
            return Err(ConsoleError::ParentageRequired);
        }
        record.creator = self.creator.clone();
        record.tainted = as_hypothesis;
        let result = self
            .rpc
            .send_and_wait(Command::AddFact { record, as_hypothesis }, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::Id(id) => Ok(id),
            _ => Err(ConsoleError::Remote("malformed addFact response".to_string())),
        }
    }

    pub(crate) fn print(&self, message: &str) {
        let _ = self.rpc.send_and_ignore(Command::Print {
            message: message.to_string(),
        });
    }

    pub(crate) fn create_temp_directory(&self) -> Result<PathBuf, ConsoleError> {
        self.directory.temp_dir()
    }
}
