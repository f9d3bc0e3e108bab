// SPDX-License-Identifier: Apache-2.0
//! Single dispatch-table-driven server loop (§4.3).
//!
//! The server owns one background thread. It pulls [`crate::client::Envelope`]s
//! off its inbox and dispatches by [`CommandKind`]/[`StreamKind`]; when the
//! inbox is empty it consults the idle function to decide whether the game
//! has quiesced (§4.4.6).

use crate::client::{Envelope, RpcClient};
use crate::command::{Command, CommandKind, CommandResult, StreamCommand, StreamItem, StreamKind};
use crate::entity::{Entity, EntityKind};
use crate::error::RpcError;
use crate::message::{Request, RequestBody, RequestId, Response};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Handles one unary command. Registered per [`CommandKind`].
///
/// Most handlers answer immediately: `Ok(Some(result))` or `Err(reason)`
/// and `dispatch` sends the reply itself. A handler that cannot answer
/// yet (e.g. `WaitTillFact` with no matching fact) returns `Ok(None)`
/// after stashing `reply` (and `id`, to tag the eventual response) in
/// its own pending-waiter state; it is then responsible for calling
/// `reply.send(...)` itself once the wait is satisfied.
pub type CommandHandler =
    Box<dyn Fn(Entity, Command, RequestId, &Sender<Response>) -> Result<Option<CommandResult>, String> + Send>;

/// Seeds a freshly opened stream with any already-existing matches and
/// records interest for future ones. Registered per [`StreamKind`].
pub type StreamStartHandler =
    Box<dyn Fn(Entity, RequestId, &StreamCommand, &Sender<StreamItem>) -> Result<(), String> + Send>;

/// Releases the interest a start handler recorded. Registered per
/// [`StreamKind`].
pub type StreamStopHandler = Box<dyn Fn(RequestId) + Send>;

/// Called whenever the inbox goes empty; `idle_since` is when the last
/// non-noop message was processed. Returning `true` stops the server
/// loop (§4.4.6 time-cap / quiescence policy lives above this, in the
/// coordinator, which supplies this closure).
pub type IdleFn = Box<dyn Fn(Instant) -> bool + Send>;

static CLIENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// See [`RpcServer::client_factory`].
#[derive(Clone)]
pub struct ClientFactory {
    inbox_tx: Sender<Envelope>,
}

impl ClientFactory {
    /// Mints a new [`RpcClient`], identical in effect to
    /// [`RpcServer::create_client`].
    #[must_use]
    pub fn create_client(&self, kind: EntityKind, id: u64, clone_id: Option<u64>) -> RpcClient {
        let client_id = CLIENT_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        RpcClient::new(Entity::new(client_id, kind, id, clone_id), self.inbox_tx.clone())
    }
}

/// The in-process RPC server: owns the inbox, the handler tables, and
/// the background dispatch thread.
pub struct RpcServer {
    inbox_tx: Sender<Envelope>,
    inbox_rx: Option<Receiver<Envelope>>,
    handlers: HashMap<CommandKind, CommandHandler>,
    start_handlers: HashMap<StreamKind, StreamStartHandler>,
    stop_handlers: HashMap<StreamKind, StreamStopHandler>,
    idle_fn: Option<IdleFn>,
    thread: Option<JoinHandle<()>>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    /// Creates a server with an empty dispatch table. Call
    /// [`RpcServer::register_handler`]/[`RpcServer::register_stream_handlers`]
    /// and [`RpcServer::register_idle_fn`] before [`RpcServer::start`].
    #[must_use]
    pub fn new() -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel();
        Self {
            inbox_tx,
            inbox_rx: Some(inbox_rx),
            handlers: HashMap::new(),
            start_handlers: HashMap::new(),
            stop_handlers: HashMap::new(),
            idle_fn: None,
            thread: None,
        }
    }

    /// Registers the handler for one [`CommandKind`], replacing any prior
    /// registration.
    pub fn register_handler(&mut self, kind: CommandKind, handler: CommandHandler) {
        self.handlers.insert(kind, handler);
    }

    /// Registers the start/stop pair for one [`StreamKind`].
    pub fn register_stream_handlers(&mut self, kind: StreamKind, start: StreamStartHandler, stop: StreamStopHandler) {
        self.start_handlers.insert(kind, start);
        self.stop_handlers.insert(kind, stop);
    }

    /// Registers the idle function consulted whenever the inbox is empty.
    pub fn register_idle_fn(&mut self, idle_fn: IdleFn) {
        self.idle_fn = Some(idle_fn);
    }

    /// Mints a new [`RpcClient`] wired to this server's inbox.
    #[must_use]
    pub fn create_client(&self, kind: EntityKind, id: u64, clone_id: Option<u64>) -> RpcClient {
        let client_id = CLIENT_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        RpcClient::new(Entity::new(client_id, kind, id, clone_id), self.inbox_tx.clone())
    }

    /// A sender clonable into other components (e.g. the coordinator's
    /// own synthetic requests) that need to post directly into the
    /// inbox.
    #[must_use]
    pub fn inbox(&self) -> Sender<Envelope> {
        self.inbox_tx.clone()
    }

    /// A clonable, `'static` handle that mints [`RpcClient`]s without
    /// borrowing the server itself. Trackers hold one of these across
    /// the whole game to spawn clones long after `start()` is called,
    /// when a borrowed `&RpcServer` is no longer available (§4.5).
    #[must_use]
    pub fn client_factory(&self) -> ClientFactory {
        ClientFactory {
            inbox_tx: self.inbox_tx.clone(),
        }
    }

    /// Spawns the dispatch thread.
    ///
    /// # Panics
    /// Panics if called twice on the same server, or before an idle
    /// function is registered.
    #[allow(clippy::expect_used)] // documented panics: programmer-error misuse, not a runtime failure
    pub fn start(&mut self) {
        let rx = self.inbox_rx.take().expect("RpcServer::start called twice");
        let handlers = std::mem::take(&mut self.handlers);
        let start_handlers = std::mem::take(&mut self.start_handlers);
        let stop_handlers = std::mem::take(&mut self.stop_handlers);
        let idle_fn = self.idle_fn.take().expect("idle function must be registered before start");

        self.thread = Some(thread::spawn(move || {
            run_loop(rx, &handlers, &start_handlers, &stop_handlers, &idle_fn);
        }));
    }

    /// Blocks until the dispatch thread exits (its idle function
    /// returned `true`, or the inbox was dropped).
    ///
    /// # Errors
    /// Returns [`RpcError::ServerGone`] if the thread already panicked.
    pub fn join(&mut self) -> Result<(), RpcError> {
        if let Some(handle) = self.thread.take() {
            handle.join().map_err(|_| RpcError::ServerGone)?;
        }
        Ok(())
    }
}

fn run_loop(
    rx: Receiver<Envelope>,
    handlers: &HashMap<CommandKind, CommandHandler>,
    start_handlers: &HashMap<StreamKind, StreamStartHandler>,
    stop_handlers: &HashMap<StreamKind, StreamStopHandler>,
    idle_fn: &IdleFn,
) {
    let mut idle_since = Instant::now();
    let mut open_streams: HashMap<RequestId, StreamKind> = HashMap::new();

    loop {
        match rx.recv_timeout(Duration::from_millis(5)) {
            Ok(envelope) => {
                idle_since = Instant::now();
                dispatch(envelope, handlers, start_handlers, stop_handlers, &mut open_streams);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if idle_fn(idle_since) {
                    return;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn dispatch(
    envelope: Envelope,
    handlers: &HashMap<CommandKind, CommandHandler>,
    start_handlers: &HashMap<StreamKind, StreamStartHandler>,
    stop_handlers: &HashMap<StreamKind, StreamStopHandler>,
    open_streams: &mut HashMap<RequestId, StreamKind>,
) {
    let Envelope {
        request,
        reply,
        stream_items,
    } = envelope;
    let Request { id, entity, body } = request;

    match body {
        RequestBody::Command(command) => {
            if !matches!(command, Command::Noop) {
                tracing::debug!(%entity, request_id = id, kind = ?command.kind(), "dispatching command");
            }
            let outcome = match handlers.get(&command.kind()) {
                Some(handler) => handler(entity, command, id, &reply),
                None => Err(format!("no handler registered for {:?}", command.kind())),
            };
            match outcome {
                Ok(Some(result)) => {
                    let _ = reply.send(Response::ok(id, result));
                }
                Ok(None) => {}
                Err(reason) => {
                    let _ = reply.send(Response::error(id, reason));
                }
            }
        }
        RequestBody::StartStream(stream_command) => {
            let Some(items_tx) = stream_items else {
                let _ = reply.send(Response::error(id, "start-stream envelope missing item channel"));
                return;
            };
            let kind = stream_command.kind();
            let outcome = match start_handlers.get(&kind) {
                Some(handler) => handler(entity, id, &stream_command, &items_tx),
                None => Err(format!("no start handler registered for {kind:?}")),
            };
            match outcome {
                Ok(()) => {
                    open_streams.insert(id, kind);
                    let _ = reply.send(Response::ok(id, CommandResult::Id(id)));
                }
                Err(reason) => {
                    let _ = reply.send(Response::error(id, reason));
                }
            }
        }
        RequestBody::StopStream { stream_id } => {
            if let Some(kind) = open_streams.remove(&stream_id) {
                if let Some(stop) = stop_handlers.get(&kind) {
                    stop(stream_id);
                }
            }
            let _ = reply.send(Response::ok(id, CommandResult::Unit));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatches_registered_command_and_replies_ok() {
        let mut server = RpcServer::new();
        server.register_handler(
            CommandKind::Noop,
            Box::new(|_entity, _cmd, _id, _reply| Ok(Some(CommandResult::Unit))),
        );
        server.register_idle_fn(Box::new(|_since| false));
        server.start();

        let client = server.create_client(EntityKind::Npc, 1, None);
        let result = client.send_and_wait(Command::Noop, Some(Duration::from_secs(1))).unwrap();
        assert!(matches!(result, CommandResult::Unit));
    }

    #[test]
    fn unregistered_command_returns_handler_error() {
        let mut server = RpcServer::new();
        server.register_idle_fn(Box::new(|_since| false));
        server.start();

        let client = server.create_client(EntityKind::Npc, 1, None);
        let err = client
            .send_and_wait(Command::GetAllObjects, Some(Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, RpcError::Handler(_)));
    }

    #[test]
    fn idle_fn_stops_server_after_quiescence() {
        let mut server = RpcServer::new();
        let ticks = Arc::new(Mutex::new(0_u32));
        let ticks_clone = Arc::clone(&ticks);
        server.register_idle_fn(Box::new(move |_since| {
            let mut n = ticks_clone.lock().unwrap();
            *n += 1;
            *n >= 3
        }));
        server.start();
        server.join().unwrap();
        assert!(*ticks.lock().unwrap() >= 3);
    }
}
