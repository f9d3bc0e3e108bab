// SPDX-License-Identifier: Apache-2.0
//! Back-story category dispatch: weight-ordered, short-circuiting on
//! the first handler that returns `true` (§4.4.7).

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use warden_analyzer::BackStoryAnalyzer;
use warden_console::{BackStoryConsole, BaseConsole, DirectoryHandler};
use warden_facts::Record;
use warden_rpc::{ClientFactory, EntityKind};

/// One registered back-story entry within a category: its analyzer
/// instance, console, and dispatch weight.
struct Entry {
    name: String,
    weight: i64,
    interests: BTreeSet<String>,
    console: BackStoryConsole,
    analyzer: Box<dyn BackStoryAnalyzer>,
}

/// All back-stories sharing one category name, tried in ascending
/// weight order for every fact the category queue receives.
pub struct BackStoryCategoryTracker {
    category: String,
    queue: Option<Sender<Record>>,
    busy: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BackStoryCategoryTracker {
    /// Spawns the category's worker thread over `entries`, sorted by
    /// ascending weight before dispatch begins.
    pub fn spawn(category: String, mut entries: Vec<(String, i64, BTreeSet<String>, BackStoryConsole, Box<dyn BackStoryAnalyzer>)>) -> Self {
        entries.sort_by_key(|(_, weight, ..)| *weight);
        let mut ordered: Vec<Entry> = entries
            .into_iter()
            .map(|(name, weight, interests, console, analyzer)| Entry {
                name,
                weight,
                interests,
                console,
                analyzer,
            })
            .collect();

        let (tx, rx) = mpsc::channel::<Record>();
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = Arc::clone(&busy);
        let worker = std::thread::spawn(move || {
            while let Ok(fact) = rx.recv() {
                worker_busy.store(true, Ordering::SeqCst);
                for entry in &mut ordered {
                    if !entry.interests.is_empty() && !entry.interests.contains(&fact.kind) {
                        continue;
                    }
                    match entry.analyzer.handle_fact(&entry.console, &fact) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(err) => tracing::warn!(backstory = %entry.name, weight = entry.weight, error = %err, "back-story handler failed"),
                    }
                }
                worker_busy.store(false, Ordering::SeqCst);
            }
        });

        Self {
            category,
            queue: Some(tx),
            busy,
            worker: Some(worker),
        }
    }

    /// Category name this tracker dispatches for.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Enqueues `fact` for weight-ordered dispatch within this category.
    pub fn dispatch(&self, fact: Record) {
        if let Some(queue) = &self.queue {
            let _ = queue.send(fact);
        }
    }

    /// True while the category worker is inside a `handleFact` pass
    /// (§4.4.6 liveness).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Drop for BackStoryCategoryTracker {
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Builds the per-back-story console an [`Entry`] wraps its analyzer in.
///
/// # Errors
/// Returns a description of the failure if the back-story's private
/// directory could not be created.
pub fn build_backstory_console(
    id: u64,
    factory: &ClientFactory,
    temp_root: &std::path::Path,
) -> Result<BackStoryConsole, String> {
    let rpc = factory.create_client(EntityKind::BackStory, id, None);
    let creator = rpc.entity().to_string();
    let directory = DirectoryHandler::new(temp_root, "backstory", id).map_err(|e| e.to_string())?;
    Ok(BackStoryConsole::new(BaseConsole::new(rpc, directory, creator)))
}
