// SPDX-License-Identifier: Apache-2.0
//! NPC tracker: one worker, one input queue, serial `handleData` calls,
//! no clones or taint (§4.6).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use warden_analyzer::NpcAnalyzer;
use warden_blackboard::FileObject;
use warden_console::{BaseConsole, DirectoryHandler, NpcConsole};
use warden_rpc::{ClientFactory, EntityKind};

/// Tracks one registered NPC: a dedicated worker thread draining its own
/// object queue.
pub struct NpcTracker {
    name: String,
    queue: Option<Sender<FileObject>>,
    busy: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl NpcTracker {
    /// Spawns the NPC's worker thread with `analyzer` as its handler,
    /// wired to `rpc_server` under tracker id `id`.
    ///
    /// # Errors
    /// Returns a description of the failure if the NPC's private
    /// directory could not be created.
    pub fn spawn(
        name: String,
        id: u64,
        mut analyzer: Box<dyn NpcAnalyzer>,
        factory: &ClientFactory,
        temp_root: &Path,
    ) -> Result<Self, String> {
        let rpc = factory.create_client(EntityKind::Npc, id, None);
        let creator = rpc.entity().to_string();
        let directory = DirectoryHandler::new(temp_root, "npc", id).map_err(|e| e.to_string())?;
        let console = NpcConsole::new(BaseConsole::new(rpc, directory, creator));

        let (tx, rx) = mpsc::channel::<FileObject>();
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = Arc::clone(&busy);
        let worker = std::thread::spawn(move || {
            while let Ok(object) = rx.recv() {
                worker_busy.store(true, Ordering::SeqCst);
                if let Err(err) = analyzer.handle_data(&console, &object) {
                    tracing::warn!(error = %err, "npc handler failed");
                }
                worker_busy.store(false, Ordering::SeqCst);
            }
        });

        Ok(Self {
            name,
            queue: Some(tx),
            busy,
            worker: Some(worker),
        })
    }

    /// Display name of the registered NPC class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues `object` for serial processing. A closed worker (already
    /// stopped) silently drops the delivery.
    pub fn dispatch(&self, object: FileObject) {
        if let Some(queue) = &self.queue {
            let _ = queue.send(object);
        }
    }

    /// True while the worker is inside `handleData` (§4.4.6 liveness).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Drop for NpcTracker {
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
