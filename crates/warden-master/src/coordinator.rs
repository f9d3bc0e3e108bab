// SPDX-License-Identifier: Apache-2.0
//! The `GameMaster` coordinator (§4): the single dispatch-thread owner
//! that wires every RPC command/stream handler to the shared blackboard,
//! spawns and reaps the player/NPC/back-story trackers, and decides
//! quiescence (§4.4.6).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use semver::Version;
use warden_analyzer::BackStoryAnalyzer;
use warden_blackboard::{BlackboardView, FileObject, NewObject};
use warden_config::{validate_options, EngineConfig, OptionBag};
use warden_console::BackStoryConsole;
use warden_facts::{Record, RecordRegistry};
use warden_registry::EngineRegistry;
use warden_rpc::{
    ClientFactory, Command, CommandKind, CommandResult, Entity, EntityKind, Response, RpcServer, StreamCommand,
    StreamItem, StreamKind,
};
use warden_screen::ScreenRunner;
use warden_trackers::{build_backstory_console, BackStoryCategoryTracker, ClonePhase, NpcTracker, PlayerTracker};

use crate::error::MasterError;
use crate::save::{check_engine_version, NamedMemorySnapshot, PlayerSnapshot, SaveState, SavedObject, VersionCompat};
use crate::seed::{resolve_backstory_facts, GameSeed};
use crate::state::{Blackboard, ObjectInsert};
use crate::streams::{selects, StreamRegistry};
use crate::waiters::{PendingWait, WaitList};

/// Consecutive empty-inbox ticks (each 5ms, per [`warden_rpc::RpcServer`])
/// with no running/waiting clone and no waiting player before the game
/// is declared quiescent (§4.4.6).
const IDLE_QUIESCENCE_TICKS: u64 = 100;

fn duration_or_none(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Fallback option bag for an entity absent from the configuration
/// document: no entity-specific keys, just `common` merged in, matching
/// what [`EngineConfig::player_options`] and its siblings would have
/// produced had the entity been configured explicitly.
fn default_options(common: &OptionBag) -> OptionBag {
    let mut bag = OptionBag::new();
    let common_value = common.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    bag.insert("common".to_string(), serde_json::Value::Object(common_value));
    bag
}

type BackStoryEntry = (String, i64, BTreeSet<String>, BackStoryConsole, Box<dyn BackStoryAnalyzer>);

/// Builds every tracker/runner named by `registry`, validating each
/// entity's configured options against its declared schema along the
/// way. Shared between [`GameMaster::build`] and [`GameMaster::load`],
/// since both stand up the identical set of trackers before diverging
/// on blackboard population.
fn build_trackers_and_screens(
    registry: EngineRegistry,
    config: &EngineConfig,
    factory: &ClientFactory,
    temp_root: &Path,
) -> Result<(Vec<PlayerTracker>, Vec<NpcTracker>, BTreeMap<String, BackStoryCategoryTracker>, Vec<ScreenRunner>), MasterError> {
    let turn_cap = duration_or_none(config.engine.max_turn_time);
    let (players_cat, npcs_cat, backstories_cat, screens_cat) = registry.into_catalogs();

    let mut players = Vec::new();
    for (idx, (name, entry)) in players_cat.into_entries().enumerate() {
        let id = idx as u64;
        let options = config.player_options(&name).unwrap_or_else(|| default_options(&config.common));
        validate_options(&entry.metadata.base.options_schema, &options)?;
        players.push(PlayerTracker::new(
            name,
            id,
            entry.metadata.fact_interests,
            entry.metadata.hyp_interests,
            entry.constructor,
            turn_cap,
        ));
    }

    let mut npcs = Vec::new();
    for (idx, (name, entry)) in npcs_cat.into_entries().enumerate() {
        let id = idx as u64;
        let options = config.npc_options(&name).unwrap_or_else(|| default_options(&config.common));
        validate_options(&entry.metadata.base.options_schema, &options)?;
        let analyzer = (entry.constructor)().map_err(MasterError::TrackerSetup)?;
        let tracker = NpcTracker::spawn(name, id, analyzer, factory, temp_root).map_err(MasterError::TrackerSetup)?;
        npcs.push(tracker);
    }

    let mut by_category: BTreeMap<String, Vec<BackStoryEntry>> = BTreeMap::new();
    for (idx, (name, entry)) in backstories_cat.into_entries().enumerate() {
        let id = idx as u64;
        let options = config.backstory_options(&name).unwrap_or_else(|| default_options(&config.common));
        validate_options(&entry.metadata.base.options_schema, &options)?;
        let analyzer = (entry.constructor)().map_err(MasterError::TrackerSetup)?;
        let console = build_backstory_console(id, factory, temp_root).map_err(MasterError::TrackerSetup)?;
        by_category.entry(entry.metadata.category.clone()).or_default().push((
            name,
            entry.metadata.default_weight,
            entry.metadata.interests,
            console,
            analyzer,
        ));
    }
    let backstory_categories = by_category
        .into_iter()
        .map(|(category, entries)| {
            let tracker = BackStoryCategoryTracker::spawn(category.clone(), entries);
            (category, tracker)
        })
        .collect();

    let mut screens = Vec::new();
    for (name, entry) in screens_cat.into_entries() {
        let options = config.screen_options(&name).unwrap_or_else(|| default_options(&config.common));
        screens.push(ScreenRunner::build(name, &entry.metadata, &entry.constructor, &options)?);
    }

    Ok((players, npcs, backstory_categories, screens))
}

/// Everything the dispatch thread's handlers close over. Guarded by one
/// mutex so the coordinator remains the blackboard's single writer (§5)
/// regardless of which handler closure runs.
struct Inner {
    blackboard: Blackboard,
    waiters: WaitList,
    streams: StreamRegistry,
    players: Vec<PlayerTracker>,
    npcs: Vec<NpcTracker>,
    backstory_categories: BTreeMap<String, BackStoryCategoryTracker>,
    screens: Vec<ScreenRunner>,
    temp_root: PathBuf,
    engine_version: Version,
    game_started: Instant,
    grace_time: Duration,
    max_game_time: Option<Duration>,
    idle_streak: u64,
}

impl Inner {
    /// Quiescence check run every time the RPC inbox goes idle (§4.4.6):
    /// reaps finished/over-budget clones, then walks liveness from most
    /// to least urgent — running back-stories, running player clones,
    /// running NPCs, waiting player clones past grace — before counting
    /// consecutive fully-idle ticks toward the game's end.
    fn idle_tick(&mut self, idle_since: Instant) -> bool {
        for player in &self.players {
            player.reap();
        }

        if let Some(cap) = self.max_game_time {
            if self.game_started.elapsed() >= cap {
                return true;
            }
        }

        if self.backstory_categories.values().any(BackStoryCategoryTracker::is_running) {
            self.idle_streak = 0;
            return false;
        }
        if self.players.iter().any(|p| p.aggregate_phase() == ClonePhase::Running) {
            self.idle_streak = 0;
            return false;
        }
        if self.npcs.iter().any(NpcTracker::is_running) {
            self.idle_streak = 0;
            return false;
        }
        if self.players.iter().any(|p| p.aggregate_phase() == ClonePhase::Waiting) {
            if idle_since.elapsed() > self.grace_time {
                return true;
            }
            self.idle_streak = 0;
            return false;
        }

        self.idle_streak += 1;
        self.idle_streak >= IDLE_QUIESCENCE_TICKS
    }
}

/// The running game: an RPC server dispatching against the shared
/// blackboard, plus the tracker/screen fleet [`GameMaster::build`] (or
/// [`GameMaster::load`]) stood up from an [`EngineRegistry`] (§4).
pub struct GameMaster {
    server: RpcServer,
    inner: Arc<Mutex<Inner>>,
    factory: ClientFactory,
}

impl GameMaster {
    /// Stands up a fresh game: builds every registered tracker/screen,
    /// then applies `seed` — exactly one of a binary object (dispatched
    /// to every NPC) or a back-story seed document (dispatched straight
    /// to the back-story categories, never occupying a fact-table id;
    /// see [`crate::seed`]) — before the dispatch thread is started.
    ///
    /// # Errors
    /// Returns [`MasterError::InvalidSetup`] if `seed` is `None`, or any
    /// collaborator error encountered while building trackers, screens,
    /// or applying the seed.
    pub fn build(
        registry: EngineRegistry,
        record_registry: RecordRegistry,
        config: EngineConfig,
        seed: Option<GameSeed>,
    ) -> Result<Self, MasterError> {
        let engine_version = registry.engine_version().clone();
        let temp_root = config.engine.temporary.clone().unwrap_or_else(std::env::temp_dir);
        let grace_time = Duration::from_secs(config.engine.grace_time);
        let max_game_time = duration_or_none(config.engine.max_game_time);

        let mut server = RpcServer::new();
        let factory = server.client_factory();

        let (players, npcs, backstory_categories, screens) =
            build_trackers_and_screens(registry, &config, &factory, &temp_root)?;

        let mut blackboard = Blackboard::new(record_registry);
        match seed {
            Some(GameSeed::Object { data, filename }) => {
                let mut metadata = BTreeMap::new();
                if let Some(filename) = filename {
                    metadata.insert("filename".to_string(), serde_json::Value::String(filename));
                }
                let outcome = blackboard.insert_object(NewObject {
                    data,
                    creator: "GameMaster".to_string(),
                    metadata,
                    ..NewObject::default()
                })?;
                if let ObjectInsert::Inserted(id) = outcome {
                    if let Some(object) = blackboard.objects.get(id).cloned() {
                        for npc in &npcs {
                            npc.dispatch(object.clone());
                        }
                    }
                }
            }
            Some(GameSeed::BackStoryFacts(doc)) => {
                let facts = resolve_backstory_facts(&doc, &blackboard.registry);
                for fact in facts {
                    for tracker in backstory_categories.values() {
                        tracker.dispatch(fact.clone());
                    }
                }
            }
            None => return Err(MasterError::InvalidSetup("no startup seed supplied".to_string())),
        }

        let inner = Arc::new(Mutex::new(Inner {
            blackboard,
            waiters: WaitList::new(),
            streams: StreamRegistry::new(),
            players,
            npcs,
            backstory_categories,
            screens,
            temp_root,
            engine_version,
            game_started: Instant::now(),
            grace_time,
            max_game_time,
            idle_streak: 0,
        }));

        register_handlers(&mut server, &inner, &factory);

        Ok(Self { server, inner, factory })
    }

    /// Restores a previously [`GameMaster::save`]d game: rebuilds every
    /// tracker/screen exactly as [`GameMaster::build`] would, restores
    /// the blackboard's objects/facts/hypotheses under their original
    /// ids, reattaches each player's saved memory/dedup state by name,
    /// and re-delivers every stored fact/hypothesis to the players
    /// interested in it — the dedup already restored into `seen_facts`/
    /// `seen_hyps` means only genuinely unseen records result in a
    /// fresh clone (§4.4.8).
    ///
    /// # Errors
    /// Returns [`MasterError::SaveState`] if the snapshot's engine
    /// version is newer than `registry`'s, or any collaborator error
    /// encountered while rebuilding trackers or restoring the blackboard.
    pub fn load(
        registry: EngineRegistry,
        record_registry: RecordRegistry,
        config: EngineConfig,
        state: SaveState,
    ) -> Result<Self, MasterError> {
        let engine_version = registry.engine_version().clone();
        match check_engine_version(&state.engine_version, &engine_version) {
            Ok(VersionCompat::Older) => {
                tracing::warn!(saved = %state.engine_version, running = %engine_version, "loading save from an older engine version");
            }
            Ok(VersionCompat::Exact) => {}
            Err(reason) => return Err(MasterError::SaveState(reason)),
        }

        let temp_root = state.temp_base.clone();
        let grace_time = Duration::from_secs(config.engine.grace_time);
        let max_game_time = duration_or_none(config.engine.max_game_time);

        let mut server = RpcServer::new();
        let factory = server.client_factory();

        let (players, npcs, backstory_categories, screens) =
            build_trackers_and_screens(registry, &config, &factory, &temp_root)?;

        let mut blackboard = Blackboard::new(record_registry);

        let mut objects: Vec<FileObject> = state
            .objects
            .into_iter()
            .map(SavedObject::into_object)
            .collect::<Result<_, _>>()
            .map_err(MasterError::SaveState)?;
        objects.sort_by_key(|object| object.id);
        for object in objects {
            blackboard.restore_object(object);
        }

        let mut facts = state.facts;
        facts.sort_by_key(|record| record.id);
        for fact in &facts {
            blackboard.restore_fact(fact.clone())?;
        }

        let mut hyps = state.hyps;
        hyps.sort_by_key(|record| record.id);
        for hyp in &hyps {
            blackboard.restore_hyp(hyp.clone())?;
        }

        for player in &players {
            if let Some(snapshot) = state.players.iter().find(|saved| saved.name == player.name()) {
                restore_player_snapshot(player, snapshot);
            }
            for fact in &facts {
                if player.wants_fact(&fact.kind) {
                    if let Err(err) = player.deliver_fact(&factory, &temp_root, fact) {
                        tracing::warn!(player = player.name(), error = %err, "post-load fact re-delivery failed");
                    }
                }
            }
            for hyp in &hyps {
                if player.wants_hyp(&hyp.kind) {
                    if let Err(err) = player.deliver_hyp(&factory, &temp_root, hyp) {
                        tracing::warn!(player = player.name(), error = %err, "post-load hypothesis re-delivery failed");
                    }
                }
            }
        }

        let inner = Arc::new(Mutex::new(Inner {
            blackboard,
            waiters: WaitList::new(),
            streams: StreamRegistry::new(),
            players,
            npcs,
            backstory_categories,
            screens,
            temp_root,
            engine_version,
            game_started: Instant::now(),
            grace_time,
            max_game_time,
            idle_streak: 0,
        }));

        register_handlers(&mut server, &inner, &factory);

        Ok(Self { server, inner, factory })
    }

    /// Starts the dispatch thread. Idempotent-looking but isn't — see
    /// [`RpcServer::start`]'s panic contract.
    pub fn start(&mut self) {
        self.server.start();
    }

    /// Blocks until the dispatch thread quiesces.
    ///
    /// # Errors
    /// Returns [`MasterError::Rpc`] if the dispatch thread panicked.
    pub fn join(&mut self) -> Result<(), MasterError> {
        self.server.join().map_err(MasterError::from)
    }

    /// Runs every registered screen's `present` against the current
    /// blackboard, paired with its display name (§4.7, §6.4). Intended
    /// to be called once [`GameMaster::join`] has returned.
    #[must_use]
    pub fn present_screens(&self) -> Vec<(String, String)> {
        let guard = self.inner.lock().expect("coordinator state poisoned");
        let view = BlackboardView {
            facts: &guard.blackboard.facts,
            hyps: &guard.blackboard.hyps,
            objects: &guard.blackboard.objects,
        };
        guard
            .screens
            .iter()
            .map(|screen| (screen.name().to_string(), screen.present(view)))
            .collect()
    }

    /// Starts the game, blocks until it quiesces, and presents every
    /// registered screen.
    ///
    /// # Errors
    /// See [`GameMaster::join`].
    pub fn run(&mut self) -> Result<Vec<(String, String)>, MasterError> {
        self.start();
        self.join()?;
        Ok(self.present_screens())
    }

    /// A clonable handle for minting additional RPC clients against this
    /// game's server, e.g. from a loader's own startup hooks.
    #[must_use]
    pub fn client_factory(&self) -> ClientFactory {
        self.factory.clone()
    }

    /// Serialises the current blackboard and every player's dedup/memory
    /// state into a [`SaveState`] (§4.4.8, §6.3). NPC and back-story
    /// entries carry their display name only — the analyzer traits
    /// expose no hook to extract a boxed instance's internal state, so
    /// there is nothing else to capture for those two kinds.
    #[must_use]
    pub fn save(&self) -> SaveState {
        let guard = self.inner.lock().expect("coordinator state poisoned");

        let mut facts: Vec<Record> = guard.blackboard.facts.all().cloned().collect();
        facts.sort_by_key(|record| record.id);
        let mut hyps: Vec<Record> = guard.blackboard.hyps.all().cloned().collect();
        hyps.sort_by_key(|record| record.id);
        let objects = guard.blackboard.objects.iter().map(SavedObject::from).collect();

        let players = guard
            .players
            .iter()
            .map(|player| PlayerSnapshot {
                name: player.name().to_string(),
                memory: player.memory().lock().expect("player memory lock poisoned").clone(),
                clone_memory: player.clone_memory().lock().expect("clone memory lock poisoned").clone(),
                seen_facts: player.seen_facts().lock().expect("seen-facts lock poisoned").clone(),
                seen_hyps: player.seen_hyps().lock().expect("seen-hyps lock poisoned").clone(),
            })
            .collect();
        let npcs = guard
            .npcs
            .iter()
            .map(|npc| NamedMemorySnapshot {
                name: npc.name().to_string(),
                memory: BTreeMap::new(),
            })
            .collect();
        let backstories = guard
            .backstory_categories
            .values()
            .map(|tracker| NamedMemorySnapshot {
                name: tracker.category().to_string(),
                memory: BTreeMap::new(),
            })
            .collect();

        SaveState {
            engine_version: guard.engine_version.to_string(),
            temp_base: guard.temp_root.clone(),
            objects,
            facts,
            hyps,
            players,
            npcs,
            backstories,
        }
    }
}

fn restore_player_snapshot(player: &PlayerTracker, snapshot: &PlayerSnapshot) {
    *player.memory().lock().expect("player memory lock poisoned") = snapshot.memory.clone();
    *player.clone_memory().lock().expect("clone memory lock poisoned") = snapshot.clone_memory.clone();
    *player.seen_facts().lock().expect("seen-facts lock poisoned") = snapshot.seen_facts.clone();
    *player.seen_hyps().lock().expect("seen-hyps lock poisoned") = snapshot.seen_hyps.clone();
}

fn register_handlers(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>, factory: &ClientFactory) {
    register_noop(server);
    register_print(server);
    register_add_object(server, inner);
    register_add_fact(server, inner, factory);
    register_read_handlers(server, inner);
    register_wait_till_fact(server, inner);
    register_promote(server, inner);
    register_create_temp_directory(server, inner);
    register_streams(server, inner);
    register_idle_fn(server, inner);
}

fn register_noop(server: &mut RpcServer) {
    server.register_handler(
        CommandKind::Noop,
        Box::new(|_entity, _command, _id, _reply| Ok(Some(CommandResult::Unit))),
    );
}

fn register_print(server: &mut RpcServer) {
    server.register_handler(
        CommandKind::Print,
        Box::new(|entity, command, _id, _reply| match command {
            Command::Print { message } => {
                tracing::info!(%entity, "{message}");
                Ok(Some(CommandResult::Unit))
            }
            _ => Err("malformed print command".to_string()),
        }),
    );
}

/// Inserts the object, replies with its id immediately, then (only on a
/// genuinely new insertion — a hash collision must not be re-dispatched,
/// §3.3) notifies child-object stream subscribers and every NPC.
fn register_add_object(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    let inner = Arc::clone(inner);
    server.register_handler(
        CommandKind::AddObject,
        Box::new(move |entity, command, id, reply| {
            let Command::AddObject(args) = command else {
                return Err("malformed addObject command".to_string());
            };
            let mut guard = inner.lock().expect("coordinator state poisoned");
            let new_object = NewObject {
                data: args.data,
                creator: entity.to_string(),
                parent_objects: args.parent_objects,
                parent_facts: args.parent_facts,
                parent_hyps: args.parent_hyps,
                metadata: args.metadata,
                encoding: args.encoding,
            };
            let outcome = guard.blackboard.insert_object(new_object).map_err(|e| e.to_string())?;
            let (reply_id, dispatch) = match outcome {
                ObjectInsert::Inserted(new_id) => (new_id, true),
                ObjectInsert::Duplicate(existing_id) => (existing_id, false),
            };
            let _ = reply.send(Response::ok(id, CommandResult::Id(reply_id)));
            if dispatch {
                if let Some(object) = guard.blackboard.objects.get(reply_id).cloned() {
                    guard.streams.notify_object(&object, entity);
                    for npc in &guard.npcs {
                        npc.dispatch(object.clone());
                    }
                }
            }
            Ok(None)
        }),
    );
}

/// Inserts the record, replies with its id immediately, then notifies
/// matching stream subscribers, `waitTillFact` waiters (facts only),
/// and every interested player — excluding the tracker whose clone
/// inserted it (§4.4.3).
fn register_add_fact(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>, factory: &ClientFactory) {
    let inner = Arc::clone(inner);
    let factory = factory.clone();
    server.register_handler(
        CommandKind::AddFact,
        Box::new(move |entity, command, id, reply| {
            let Command::AddFact { record, as_hypothesis } = command else {
                return Err("malformed addFact command".to_string());
            };
            let mut guard = inner.lock().expect("coordinator state poisoned");
            let new_id = if as_hypothesis {
                guard.blackboard.insert_hyp(record.clone())
            } else {
                guard.blackboard.insert_fact(record.clone())
            }
            .map_err(|e| e.to_string())?;
            let _ = reply.send(Response::ok(id, CommandResult::Id(new_id)));

            let mut stamped = record;
            stamped.id = Some(new_id);
            let temp_root = guard.temp_root.clone();

            if as_hypothesis {
                guard.streams.notify_hyp(&stamped, entity);
                for player in &guard.players {
                    if entity.kind == EntityKind::Player && entity.id == player.id() {
                        continue;
                    }
                    if player.wants_hyp(&stamped.kind) {
                        if let Err(err) = player.deliver_hyp(&factory, &temp_root, &stamped) {
                            tracing::warn!(player = player.name(), error = %err, "hypothesis delivery failed");
                        }
                    }
                }
            } else {
                guard.streams.notify_fact(&stamped, entity);
                guard.waiters.satisfy(&stamped);
                for player in &guard.players {
                    if entity.kind == EntityKind::Player && entity.id == player.id() {
                        continue;
                    }
                    if player.wants_fact(&stamped.kind) {
                        if let Err(err) = player.deliver_fact(&factory, &temp_root, &stamped) {
                            tracing::warn!(player = player.name(), error = %err, "fact delivery failed");
                        }
                    }
                }
            }

            Ok(None)
        }),
    );
}

fn register_read_handlers(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetObject,
            Box::new(move |_entity, command, _id, _reply| {
                let Command::GetObject { id } = command else {
                    return Err("malformed getObject command".to_string());
                };
                let guard = inner.lock().expect("coordinator state poisoned");
                Ok(Some(CommandResult::MaybeObject(guard.blackboard.objects.get(id).cloned())))
            }),
        );
    }
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetAllObjects,
            Box::new(move |_entity, _command, _id, _reply| {
                let guard = inner.lock().expect("coordinator state poisoned");
                Ok(Some(CommandResult::Objects(guard.blackboard.objects.iter().cloned().collect())))
            }),
        );
    }
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetFact,
            Box::new(move |_entity, command, _id, _reply| {
                let Command::GetFact { id } = command else {
                    return Err("malformed getFact command".to_string());
                };
                let guard = inner.lock().expect("coordinator state poisoned");
                Ok(Some(CommandResult::MaybeRecord(guard.blackboard.facts.find_by_id(id).cloned())))
            }),
        );
    }
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetAllFacts,
            Box::new(move |_entity, command, _id, _reply| {
                let Command::GetAllFacts { kinds } = command else {
                    return Err("malformed getAllFacts command".to_string());
                };
                let guard = inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(&kinds).map_err(|e| e.to_string())?;
                let resolved: Vec<String> = resolved.into_iter().collect();
                let records = guard
                    .blackboard
                    .facts
                    .get_columns(&guard.blackboard.registry, &resolved)
                    .map_err(|e| e.to_string())?
                    .into_iter()
                    .cloned()
                    .collect();
                Ok(Some(CommandResult::Records(records)))
            }),
        );
    }
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetHyp,
            Box::new(move |_entity, command, _id, _reply| {
                let Command::GetHyp { id } = command else {
                    return Err("malformed getHyp command".to_string());
                };
                let guard = inner.lock().expect("coordinator state poisoned");
                Ok(Some(CommandResult::MaybeRecord(guard.blackboard.hyps.find_by_id(id).cloned())))
            }),
        );
    }
    {
        let inner = Arc::clone(inner);
        server.register_handler(
            CommandKind::GetAllHyps,
            Box::new(move |_entity, command, _id, _reply| {
                let Command::GetAllHyps { kinds } = command else {
                    return Err("malformed getAllHyps command".to_string());
                };
                let guard = inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(&kinds).map_err(|e| e.to_string())?;
                let resolved: Vec<String> = resolved.into_iter().collect();
                let records = guard
                    .blackboard
                    .hyps
                    .get_columns(&guard.blackboard.registry, &resolved)
                    .map_err(|e| e.to_string())?
                    .into_iter()
                    .cloned()
                    .collect();
                Ok(Some(CommandResult::Records(records)))
            }),
        );
    }
}

/// Answers immediately with the smallest matching fact newer than
/// `last_fact`, if one already exists; otherwise queues a
/// [`PendingWait`] the next matching `addFact` will satisfy (§4.4.4).
fn register_wait_till_fact(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    let inner = Arc::clone(inner);
    server.register_handler(
        CommandKind::WaitTillFact,
        Box::new(move |_entity, command, id, reply| {
            let Command::WaitTillFact { kinds, last_fact } = command else {
                return Err("malformed waitTillFact command".to_string());
            };
            let mut guard = inner.lock().expect("coordinator state poisoned");
            let resolved = guard.blackboard.registry.resolve(&kinds).map_err(|e| e.to_string())?;
            let earliest = guard
                .blackboard
                .facts
                .all()
                .filter(|fact| fact.id.is_some_and(|fid| last_fact.is_none_or(|last| fid > last)) && resolved.contains(&fact.kind))
                .min_by_key(|fact| fact.id)
                .cloned();
            if let Some(fact) = earliest {
                let _ = reply.send(Response::ok(id, CommandResult::MaybeRecord(Some(fact))));
            } else {
                guard.waiters.push(PendingWait {
                    kinds: resolved,
                    reply: reply.clone(),
                    request_id: id,
                });
            }
            Ok(None)
        }),
    );
}

/// Promotes the hypothesis and replies with the resulting fact (§4.4.5).
/// No stream/waiter/player notification fires — promotion is not a
/// synthetic fact insertion.
fn register_promote(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    let inner = Arc::clone(inner);
    server.register_handler(
        CommandKind::Promote,
        Box::new(move |_entity, command, _id, _reply| {
            let Command::Promote { hyp_id } = command else {
                return Err("malformed promote command".to_string());
            };
            let mut guard = inner.lock().expect("coordinator state poisoned");
            let new_id = guard.blackboard.promote(hyp_id).map_err(|e| e.to_string())?;
            let record = new_id.and_then(|id| guard.blackboard.facts.find_by_id(id).cloned());
            Ok(Some(CommandResult::MaybeRecord(record)))
        }),
    );
}

/// Allocates a fresh temporary directory under the game's temp root.
/// Present for protocol completeness: every concrete console currently
/// shipped allocates its scratch directories locally through
/// [`warden_console::DirectoryHandler`] rather than over the wire.
fn register_create_temp_directory(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    let inner = Arc::clone(inner);
    server.register_handler(
        CommandKind::CreateTempDirectory,
        Box::new(move |_entity, _command, _id, _reply| {
            let guard = inner.lock().expect("coordinator state poisoned");
            let dir = tempfile::Builder::new()
                .prefix("tmp-")
                .tempdir_in(&guard.temp_root)
                .map(tempfile::TempDir::into_path)
                .map_err(|e| e.to_string())?;
            Ok(Some(CommandResult::Path(dir)))
        }),
    );
}

fn register_streams(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    {
        let start_inner = Arc::clone(inner);
        let stop_inner = Arc::clone(inner);
        server.register_stream_handlers(
            StreamKind::FactStream,
            Box::new(move |entity, id, stream_command, tx| {
                let StreamCommand::FactStream { kinds, only_latest } = stream_command else {
                    return Err("malformed factStream command".to_string());
                };
                let mut guard = start_inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(kinds).map_err(|e| e.to_string())?;
                if !*only_latest {
                    let resolved_vec: Vec<String> = resolved.iter().cloned().collect();
                    let existing = guard
                        .blackboard
                        .facts
                        .get_columns(&guard.blackboard.registry, &resolved_vec)
                        .map_err(|e| e.to_string())?;
                    for fact in existing {
                        let _ = tx.send(StreamItem::Record(fact.clone()));
                    }
                }
                guard.streams.add_fact_stream(id, entity, resolved, tx.clone());
                Ok(())
            }),
            Box::new(move |id| {
                stop_inner.lock().expect("coordinator state poisoned").streams.remove(id);
            }),
        );
    }
    {
        let start_inner = Arc::clone(inner);
        let stop_inner = Arc::clone(inner);
        server.register_stream_handlers(
            StreamKind::HypStream,
            Box::new(move |entity, id, stream_command, tx| {
                let StreamCommand::HypStream { kinds, only_latest } = stream_command else {
                    return Err("malformed hypStream command".to_string());
                };
                let mut guard = start_inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(kinds).map_err(|e| e.to_string())?;
                if !*only_latest {
                    let resolved_vec: Vec<String> = resolved.iter().cloned().collect();
                    let existing = guard
                        .blackboard
                        .hyps
                        .get_columns(&guard.blackboard.registry, &resolved_vec)
                        .map_err(|e| e.to_string())?;
                    for hyp in existing {
                        let _ = tx.send(StreamItem::Record(hyp.clone()));
                    }
                }
                guard.streams.add_hyp_stream(id, entity, resolved, tx.clone());
                Ok(())
            }),
            Box::new(move |id| {
                stop_inner.lock().expect("coordinator state poisoned").streams.remove(id);
            }),
        );
    }
    {
        let start_inner = Arc::clone(inner);
        let stop_inner = Arc::clone(inner);
        server.register_stream_handlers(
            StreamKind::ChildFactStream,
            Box::new(move |entity, id, stream_command, tx| {
                let StreamCommand::ChildFactStream { parent, kinds, only_latest } = stream_command else {
                    return Err("malformed childFactStream command".to_string());
                };
                let mut guard = start_inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(kinds).map_err(|e| e.to_string())?;
                if !*only_latest {
                    let resolved_vec: Vec<String> = resolved.iter().cloned().collect();
                    let existing = guard
                        .blackboard
                        .facts
                        .get_columns(&guard.blackboard.registry, &resolved_vec)
                        .map_err(|e| e.to_string())?;
                    for fact in existing.into_iter().filter(|fact| selects(*parent, &fact.provenance)) {
                        let _ = tx.send(StreamItem::Record(fact.clone()));
                    }
                }
                guard.streams.add_child_fact_stream(id, entity, *parent, resolved, tx.clone());
                Ok(())
            }),
            Box::new(move |id| {
                stop_inner.lock().expect("coordinator state poisoned").streams.remove(id);
            }),
        );
    }
    {
        let start_inner = Arc::clone(inner);
        let stop_inner = Arc::clone(inner);
        server.register_stream_handlers(
            StreamKind::ChildHypStream,
            Box::new(move |entity, id, stream_command, tx| {
                let StreamCommand::ChildHypStream { parent, kinds, only_latest } = stream_command else {
                    return Err("malformed childHypStream command".to_string());
                };
                let mut guard = start_inner.lock().expect("coordinator state poisoned");
                let resolved = guard.blackboard.registry.resolve(kinds).map_err(|e| e.to_string())?;
                if !*only_latest {
                    let resolved_vec: Vec<String> = resolved.iter().cloned().collect();
                    let existing = guard
                        .blackboard
                        .hyps
                        .get_columns(&guard.blackboard.registry, &resolved_vec)
                        .map_err(|e| e.to_string())?;
                    for hyp in existing.into_iter().filter(|hyp| selects(*parent, &hyp.provenance)) {
                        let _ = tx.send(StreamItem::Record(hyp.clone()));
                    }
                }
                guard.streams.add_child_hyp_stream(id, entity, *parent, resolved, tx.clone());
                Ok(())
            }),
            Box::new(move |id| {
                stop_inner.lock().expect("coordinator state poisoned").streams.remove(id);
            }),
        );
    }
    {
        let start_inner = Arc::clone(inner);
        let stop_inner = Arc::clone(inner);
        server.register_stream_handlers(
            StreamKind::ChildObjectStream,
            Box::new(move |entity, id, stream_command, tx| {
                let StreamCommand::ChildObjectStream { parent, only_latest } = stream_command else {
                    return Err("malformed childObjectStream command".to_string());
                };
                let mut guard = start_inner.lock().expect("coordinator state poisoned");
                if !*only_latest {
                    for object in guard.blackboard.objects.iter().filter(|object| selects(*parent, &object.provenance)) {
                        let _ = tx.send(StreamItem::Object(object.clone()));
                    }
                }
                guard.streams.add_child_object_stream(id, entity, *parent, tx.clone());
                Ok(())
            }),
            Box::new(move |id| {
                stop_inner.lock().expect("coordinator state poisoned").streams.remove(id);
            }),
        );
    }
}

fn register_idle_fn(server: &mut RpcServer, inner: &Arc<Mutex<Inner>>) {
    let inner = Arc::clone(inner);
    server.register_idle_fn(Box::new(move |idle_since| {
        inner.lock().expect("coordinator state poisoned").idle_tick(idle_since)
    }));
}
