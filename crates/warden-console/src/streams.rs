// SPDX-License-Identifier: Apache-2.0
//! Wraps [`warden_rpc::StreamHandle`] behind the
//! [`RecordStream`](warden_analyzer::RecordStream)/[`ObjectStream`](warden_analyzer::ObjectStream)
//! trait objects analyzer code consumes (§6.1).
//!
//! Each `recv` brackets the blocking wait with `waiting`/`running`
//! transitions on the owning clone's [`ClonePhaseSink`], mirroring the
//! source's `_waitOn` generator (§4.5).

use crate::base::to_console_error;
use std::sync::Arc;
use std::time::Duration;
use warden_analyzer::{ClonePhaseSink, ConsoleError, ObjectStream, RecordStream};
use warden_blackboard::FileObject;
use warden_facts::Record;
use warden_rpc::{StreamHandle, StreamItem};

/// A [`RecordStream`] backed by a live fact/hyp subscription.
pub struct RpcRecordStream {
    handle: StreamHandle,
    phase_sink: Arc<dyn ClonePhaseSink>,
}

impl RpcRecordStream {
    pub(crate) const fn new(handle: StreamHandle, phase_sink: Arc<dyn ClonePhaseSink>) -> Self {
        Self { handle, phase_sink }
    }
}

impl RecordStream for RpcRecordStream {
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Record, ConsoleError> {
        self.phase_sink.set_waiting();
        let item = self.handle.recv(timeout).map_err(to_console_error);
        self.phase_sink.set_running();
        match item? {
            StreamItem::Record(record) => Ok(record),
            StreamItem::Object(_) => Err(ConsoleError::Remote("expected a record, got an object".to_string())),
        }
    }

    fn stop(self: Box<Self>) {
        let _ = self.handle.stop();
    }
}

/// An [`ObjectStream`] backed by a live child-object subscription.
pub struct RpcObjectStream {
    handle: StreamHandle,
    phase_sink: Arc<dyn ClonePhaseSink>,
}

impl RpcObjectStream {
    pub(crate) const fn new(handle: StreamHandle, phase_sink: Arc<dyn ClonePhaseSink>) -> Self {
        Self { handle, phase_sink }
    }
}

impl ObjectStream for RpcObjectStream {
    fn recv(&mut self, timeout: Option<Duration>) -> Result<FileObject, ConsoleError> {
        self.phase_sink.set_waiting();
        let item = self.handle.recv(timeout).map_err(to_console_error);
        self.phase_sink.set_running();
        match item? {
            StreamItem::Object(object) => Ok(object),
            StreamItem::Record(_) => Err(ConsoleError::Remote("expected an object, got a record".to_string())),
        }
    }

    fn stop(self: Box<Self>) {
        let _ = self.handle.stop();
    }
}
