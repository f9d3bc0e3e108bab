// SPDX-License-Identifier: Apache-2.0
//! Player tracker: spawns one fresh clone per fact/hypothesis delivery
//! and aggregates clone liveness for the quiescence check (§4.4.6, §4.5).

use crate::clone_state::{ClonePhase, CloneState};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use warden_analyzer::AnalyzerError;
use warden_console::{BaseConsole, DirectoryHandler, PlayerConsoleImpl};
use warden_facts::Record;
use warden_registry::PlayerConstructor;
use warden_rpc::{ClientFactory, EntityKind};

struct CloneHandle {
    state: Arc<CloneState>,
    join: Option<JoinHandle<()>>,
    started: Instant,
    ignored: bool,
}

/// Tracks one registered player kind: shared memory, per-clone memory,
/// per-id dedup sets, and the live clone registry (§4.5).
pub struct PlayerTracker {
    name: String,
    id: u64,
    fact_interests: BTreeSet<String>,
    hyp_interests: BTreeSet<String>,
    constructor: PlayerConstructor,
    memory: Mutex<BTreeMap<String, serde_json::Value>>,
    clone_memory: Mutex<HashMap<u64, serde_json::Value>>,
    seen_facts: Mutex<BTreeSet<u64>>,
    seen_hyps: Mutex<BTreeSet<u64>>,
    clones: Mutex<HashMap<u64, CloneHandle>>,
    next_clone_id: AtomicU64,
    turn_cap: Option<Duration>,
}

impl PlayerTracker {
    /// Creates a tracker for a registered player kind assigned tracker id
    /// `id`, with no clones yet spawned.
    #[must_use]
    pub fn new(
        name: String,
        id: u64,
        fact_interests: BTreeSet<String>,
        hyp_interests: BTreeSet<String>,
        constructor: PlayerConstructor,
        turn_cap: Option<Duration>,
    ) -> Self {
        Self {
            name,
            id,
            fact_interests,
            hyp_interests,
            constructor,
            memory: Mutex::new(BTreeMap::new()),
            clone_memory: Mutex::new(HashMap::new()),
            seen_facts: Mutex::new(BTreeSet::new()),
            seen_hyps: Mutex::new(BTreeSet::new()),
            clones: Mutex::new(HashMap::new()),
            next_clone_id: AtomicU64::new(0),
            turn_cap,
        }
    }

    /// Display name of the registered player class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tracker-assigned id within the player kind catalog.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True if `kind` is among this player's declared fact interests.
    #[must_use]
    pub fn wants_fact(&self, kind: &str) -> bool {
        self.fact_interests.contains(kind)
    }

    /// True if `kind` is among this player's declared hypothesis interests.
    #[must_use]
    pub fn wants_hyp(&self, kind: &str) -> bool {
        self.hyp_interests.contains(kind)
    }

    /// Spawns a fresh, untainted clone to handle `fact`, unless this
    /// tracker has already delivered that fact id. Creation failures
    /// (client setup, directory setup, analyzer construction) are fatal
    /// to this delivery only.
    ///
    /// # Errors
    /// Returns [`AnalyzerError::Creation`] if the clone could not be set up.
    pub fn deliver_fact(&self, factory: &ClientFactory, temp_root: &Path, fact: &Record) -> Result<(), AnalyzerError> {
        {
            let mut seen = self.seen_facts.lock().expect("seen-facts lock poisoned");
            if let Some(id) = fact.id {
                if !seen.insert(id) {
                    return Ok(());
                }
            }
        }
        self.spawn_clone(factory, temp_root, fact.clone(), false)
    }

    /// Spawns a fresh, tainted clone to handle hypothesis `hyp`, subject
    /// to the same dedup rule as [`PlayerTracker::deliver_fact`].
    ///
    /// # Errors
    /// Returns [`AnalyzerError::Creation`] if the clone could not be set up.
    pub fn deliver_hyp(&self, factory: &ClientFactory, temp_root: &Path, hyp: &Record) -> Result<(), AnalyzerError> {
        {
            let mut seen = self.seen_hyps.lock().expect("seen-hyps lock poisoned");
            if let Some(id) = hyp.id {
                if !seen.insert(id) {
                    return Ok(());
                }
            }
        }
        self.spawn_clone(factory, temp_root, hyp.clone(), true)
    }

    fn spawn_clone(&self, factory: &ClientFactory, temp_root: &Path, record: Record, tainted: bool) -> Result<(), AnalyzerError> {
        let clone_id = self.next_clone_id.fetch_add(1, Ordering::SeqCst);
        let rpc = factory.create_client(EntityKind::Player, self.id, Some(clone_id));
        let creator = rpc.entity().to_string();
        let directory = DirectoryHandler::new(temp_root, &format!("player-{}", self.id), clone_id)
            .map_err(|e| AnalyzerError::Creation(e.to_string()))?;
        let state = Arc::new(CloneState::new());
        let base = BaseConsole::new(rpc, directory, creator);
        let console = PlayerConsoleImpl::with_phase_sink(base, tainted, Arc::clone(&state) as Arc<dyn warden_analyzer::ClonePhaseSink>);
        let mut analyzer = (self.constructor)().map_err(AnalyzerError::Creation)?;

        let thread_state = Arc::clone(&state);
        let join = std::thread::spawn(move || {
            thread_state.set_running_now();
            let outcome = if tainted {
                analyzer.handle_hypothesis(&console, &record)
            } else {
                analyzer.handle_fact(&console, &record)
            };
            if let Err(err) = outcome {
                tracing::warn!(error = %err, "player clone handler failed");
            }
            thread_state.set_stopped();
        });

        self.clones.lock().expect("clones lock poisoned").insert(
            clone_id,
            CloneHandle {
                state,
                join: Some(join),
                started: Instant::now(),
                ignored: false,
            },
        );
        Ok(())
    }

    /// Joins every clone whose thread has finished and marks any clone
    /// whose turn time exceeds `turn_cap` as ignored for liveness
    /// purposes (§4.4.6). Call periodically from the idle function.
    pub fn reap(&self) {
        let mut clones = self.clones.lock().expect("clones lock poisoned");
        let finished: Vec<u64> = clones
            .iter()
            .filter(|(_, handle)| handle.join.as_ref().is_some_and(JoinHandle::is_finished))
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            if let Some(mut handle) = clones.remove(&id) {
                if let Some(join) = handle.join.take() {
                    let _ = join.join();
                }
            }
        }
        if let Some(cap) = self.turn_cap {
            for handle in clones.values_mut() {
                if handle.started.elapsed() > cap {
                    handle.ignored = true;
                }
            }
        }
    }

    /// Aggregate liveness for the quiescence check: `running` if any
    /// non-ignored clone is running, else `waiting` if any is waiting,
    /// else `stopped` (§4.4.6).
    #[must_use]
    pub fn aggregate_phase(&self) -> ClonePhase {
        let clones = self.clones.lock().expect("clones lock poisoned");
        let mut any_waiting = false;
        for handle in clones.values() {
            if handle.ignored {
                continue;
            }
            match handle.state.phase() {
                ClonePhase::Running => return ClonePhase::Running,
                ClonePhase::Waiting => any_waiting = true,
                ClonePhase::Stopped => {}
            }
        }
        if any_waiting {
            ClonePhase::Waiting
        } else {
            ClonePhase::Stopped
        }
    }

    /// Shared memory visible to every clone of this player kind.
    #[must_use]
    pub fn memory(&self) -> &Mutex<BTreeMap<String, serde_json::Value>> {
        &self.memory
    }

    /// Per-clone memory, persisted across saves keyed by clone id.
    #[must_use]
    pub fn clone_memory(&self) -> &Mutex<HashMap<u64, serde_json::Value>> {
        &self.clone_memory
    }

    /// Fact ids already delivered to this player kind (§4.4.8 save/restore).
    #[must_use]
    pub fn seen_facts(&self) -> &Mutex<BTreeSet<u64>> {
        &self.seen_facts
    }

    /// Hypothesis ids already delivered to this player kind.
    #[must_use]
    pub fn seen_hyps(&self) -> &Mutex<BTreeSet<u64>> {
        &self.seen_hyps
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use warden_analyzer::{AnalyzerError as AErr, Console, PlayerAnalyzer, PlayerConsole};
    use warden_facts::{FieldDescriptor, FieldType, RecordDescriptor};
    use warden_rpc::{CommandResult, RpcServer};

    struct EchoPlayer;
    impl PlayerAnalyzer for EchoPlayer {
        fn handle_fact(&mut self, console: &dyn PlayerConsole, fact: &Record) -> Result<(), AErr> {
            console.print(&format!("saw {}", fact.kind));
            Ok(())
        }
        fn handle_hypothesis(&mut self, _console: &dyn PlayerConsole, _hyp: &Record) -> Result<(), AErr> {
            Ok(())
        }
    }

    fn fact(id: u64) -> Record {
        let descriptor = RecordDescriptor::new("observation").with_field(FieldDescriptor::required("n", FieldType::Int));
        let mut fields = BTreeMap::new();
        fields.insert("n".to_string(), warden_facts::FieldValue::Int(1));
        let mut record = Record::new(&descriptor, fields, String::new(), 0.0, false).unwrap();
        record.id = Some(id);
        record
    }

    #[test]
    fn deduplicates_fact_delivery_by_id() {
        let mut server = RpcServer::new();
        server.register_handler(
            warden_rpc::CommandKind::Print,
            Box::new(|_entity, _command, _id, _reply| Ok(Some(CommandResult::Unit))),
        );
        server.register_idle_fn(Box::new(|since| since.elapsed() > Duration::from_millis(200)));
        server.start();

        let tracker = PlayerTracker::new(
            "echo".to_string(),
            1,
            BTreeSet::from(["observation".to_string()]),
            BTreeSet::new(),
            Box::new(|| Ok(Box::new(EchoPlayer) as Box<dyn PlayerAnalyzer>)),
            None,
        );
        let root = tempfile::tempdir().unwrap();

        let factory = server.client_factory();
        tracker.deliver_fact(&factory, root.path(), &fact(1)).unwrap();
        tracker.deliver_fact(&factory, root.path(), &fact(1)).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        tracker.reap();
        assert_eq!(tracker.clones.lock().unwrap().len(), 0);

        server.join().unwrap();
    }
}
