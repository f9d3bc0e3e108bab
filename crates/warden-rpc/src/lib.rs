// SPDX-License-Identifier: Apache-2.0
//! In-process RPC fabric connecting analyzer clients to the coordinator
//! (§4.3). No network transport: every [`Entity`] talks to the
//! [`RpcServer`] over `std::sync::mpsc` channels within one process.

mod client;
mod command;
mod entity;
mod error;
mod message;
mod server;

pub use client::{Envelope, RpcClient, StreamHandle};
pub use command::{
    AddObjectArgs, Command, CommandKind, CommandResult, ParentSelector, StreamCommand, StreamItem, StreamKind,
};
pub use entity::{Entity, EntityKind};
pub use error::RpcError;
pub use message::{Request, RequestBody, RequestId, Response, ResponseStatus};
pub use server::{ClientFactory, CommandHandler, IdleFn, RpcServer, StreamStartHandler, StreamStopHandler};
