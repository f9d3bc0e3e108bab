// SPDX-License-Identifier: Apache-2.0
//! Request/response envelopes exchanged over the fabric (§4.3).

use crate::command::{Command, CommandResult, StreamCommand};
use crate::entity::Entity;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing request id, unique for the lifetime of one
/// [`crate::server::RpcServer`].
pub type RequestId = u64;

static MSG_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_request_id() -> RequestId {
    MSG_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Body of a [`Request`].
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// A unary command.
    Command(Command),
    /// Open a new stream.
    StartStream(StreamCommand),
    /// Close a previously opened stream.
    StopStream {
        /// Id of the request that opened the stream.
        stream_id: RequestId,
    },
}

/// One request travelling from an [`crate::client::RpcClient`] to the
/// [`crate::server::RpcServer`].
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique id, echoed back on the response.
    pub id: RequestId,
    /// Originating entity.
    pub entity: Entity,
    /// Request payload.
    pub body: RequestBody,
}

impl Request {
    /// Wraps `body` with a fresh id for `entity`.
    #[must_use]
    pub fn new(entity: Entity, body: RequestBody) -> Self {
        Self {
            id: next_request_id(),
            entity,
            body,
        }
    }
}

/// Outcome of a unary request.
#[derive(Debug, Clone)]
pub enum ResponseStatus {
    /// Succeeded, carrying the handler's result.
    Ok(CommandResult),
    /// Failed, carrying a human-readable reason.
    Error(String),
}

/// One response travelling from the server back to the originating
/// client's inbox.
#[derive(Debug, Clone)]
pub struct Response {
    /// Echoes the originating [`Request::id`].
    pub request_id: RequestId,
    /// Outcome.
    pub status: ResponseStatus,
}

impl Response {
    /// Builds an ok response.
    #[must_use]
    pub const fn ok(request_id: RequestId, result: CommandResult) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Ok(result),
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Error(reason.into()),
        }
    }
}
