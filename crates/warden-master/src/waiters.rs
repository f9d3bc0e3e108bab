// SPDX-License-Identifier: Apache-2.0
//! Pending `waitTillFact` requests that could not be answered immediately
//! (§4.4.4). Satisfied in one pass, in insertion order, the next time a
//! matching fact is inserted.

use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use warden_facts::Record;
use warden_rpc::{CommandResult, RequestId, Response};

/// One caller blocked inside `waitTillFact`, waiting for the first future
/// fact whose kind is in `kinds`.
pub struct PendingWait {
    /// Resolved (group-expanded) kinds this waiter accepts.
    pub kinds: BTreeSet<String>,
    /// Where to send the eventual reply.
    pub reply: Sender<Response>,
    /// Request id to tag the reply with.
    pub request_id: RequestId,
}

/// FIFO of pending waiters, drained whenever a matching fact lands.
#[derive(Default)]
pub struct WaitList {
    waiters: Vec<PendingWait>,
}

impl WaitList {
    /// Creates an empty wait list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending wait.
    pub fn push(&mut self, waiter: PendingWait) {
        self.waiters.push(waiter);
    }

    /// Replies to and removes every waiter whose `kinds` contains
    /// `fact.kind`; waiters that don't match stay queued.
    pub fn satisfy(&mut self, fact: &Record) {
        let mut remaining = Vec::with_capacity(self.waiters.len());
        for waiter in self.waiters.drain(..) {
            if waiter.kinds.contains(&fact.kind) {
                let _ = waiter
                    .reply
                    .send(Response::ok(waiter.request_id, CommandResult::MaybeRecord(Some(fact.clone()))));
            } else {
                remaining.push(waiter);
            }
        }
        self.waiters = remaining;
    }

    /// True if no requests are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
