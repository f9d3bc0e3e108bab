// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors raised by the RPC fabric itself (distinct from
/// [`warden_analyzer::ConsoleError`], which wraps these for analyzer
/// code, §4.3).
#[derive(Debug, Error)]
pub enum RpcError {
    /// No handler was registered for a command.
    #[error("no handler registered for command {0:?}")]
    NoHandler(String),
    /// A request timed out waiting for a response.
    #[error("request timed out")]
    Timeout,
    /// A stream timed out waiting for the next item.
    #[error("stream timed out")]
    StreamTimeout,
    /// The server side of the fabric has shut down.
    #[error("server is no longer running")]
    ServerGone,
    /// Attempted to operate on a stream id this client never opened.
    #[error("stream {0} is not tracked by this client")]
    UntrackedStream(u64),
    /// A handler reported a domain-level failure.
    #[error("{0}")]
    Handler(String),
}
