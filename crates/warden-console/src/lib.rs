// SPDX-License-Identifier: Apache-2.0
//! Concrete, RPC-backed implementations of the
//! [`warden_analyzer`] console traits (§6.1).
//!
//! `warden-analyzer` specifies the capability surface analyzer code is
//! handed; this crate wires that surface to the in-process
//! [`warden_rpc`] fabric and per-entity scratch directories.

mod backstory;
mod base;
mod directory;
mod npc;
mod player;
mod streams;

pub use backstory::BackStoryConsole;
pub use base::{BaseConsole, DEFAULT_TIMEOUT};
pub use directory::DirectoryHandler;
pub use npc::NpcConsole;
pub use player::PlayerConsoleImpl;
pub use streams::{RpcObjectStream, RpcRecordStream};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::BTreeMap;
    use warden_analyzer::{Console, ConsoleError, NewObjectArgs};
    use warden_facts::{FieldDescriptor, FieldType, FieldValue, Record, RecordDescriptor};
    use warden_rpc::{Command, CommandResult, Entity, EntityKind, RpcServer};

    fn fact_record(kind: &str, parentage_empty: bool) -> Record {
        let descriptor = RecordDescriptor::new(kind).with_field(FieldDescriptor::required("n", FieldType::Int));
        let mut fields = BTreeMap::new();
        fields.insert("n".to_string(), FieldValue::Int(1));
        let mut record = Record::new(&descriptor, fields, String::new(), 0.0, false).unwrap();
        if !parentage_empty {
            record.provenance.parent_objects.insert(7);
        }
        record
    }

    fn spawn_echo_server() -> (RpcServer, DirectoryHandler) {
        let mut server = RpcServer::new();
        server.register_handler(
            warden_rpc::CommandKind::AddFact,
            Box::new(|_entity, command, _id, _reply| match command {
                Command::AddFact { .. } => Ok(Some(CommandResult::Id(42))),
                _ => Err("unexpected command".to_string()),
            }),
        );
        server.register_handler(
            warden_rpc::CommandKind::Print,
            Box::new(|_entity, _command, _id, _reply| Ok(Some(CommandResult::Unit))),
        );
        server.register_idle_fn({
            let ticks = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
            Box::new(move |_since| {
                ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst) >= 20
            })
        });
        server.start();
        let root = tempfile::tempdir().unwrap();
        let directory = DirectoryHandler::new(root.path(), "npc", 1).unwrap();
        (server, directory)
    }

    #[test]
    fn npc_console_requires_parentage() {
        let (mut server, directory) = spawn_echo_server();
        let rpc = server.create_client(EntityKind::Npc, 1, None);
        let console = NpcConsole::new(BaseConsole::new(rpc, directory, "npc-1".to_string()));

        let err = console.add_fact(fact_record("observation", true)).unwrap_err();
        assert!(matches!(err, ConsoleError::ParentageRequired));

        let id = console.add_fact(fact_record("observation", false)).unwrap();
        assert_eq!(id, 42);

        server.join().unwrap();
    }

    #[test]
    fn backstory_console_exempts_parentage() {
        let (mut server, directory) = spawn_echo_server();
        let rpc = server.create_client(EntityKind::BackStory, 1, None);
        let console = BackStoryConsole::new(BaseConsole::new(rpc, directory, "backstory-1".to_string()));

        let id = console.add_fact(fact_record("seed", true)).unwrap();
        assert_eq!(id, 42);

        server.join().unwrap();
    }

    #[test]
    fn tainted_player_clone_rejects_add_fact_without_yesreally() {
        let (mut server, directory) = spawn_echo_server();
        let rpc = server.create_client(EntityKind::Player, 1, Some(3));
        let console = PlayerConsoleImpl::new(BaseConsole::new(rpc, directory, "player-1-clone-3".to_string()), true);

        let err = console.add_fact(fact_record("observation", false)).unwrap_err();
        assert!(matches!(err, ConsoleError::YesReallyRequired));

        let id = console.add_fact_tainted(fact_record("observation", false), true).unwrap();
        assert_eq!(id, 42);

        server.join().unwrap();
    }

    #[test]
    fn untainted_player_clone_can_add_object() {
        let mut server = RpcServer::new();
        server.register_handler(
            warden_rpc::CommandKind::AddObject,
            Box::new(|_entity, _command, _id, _reply| Ok(Some(CommandResult::Id(9)))),
        );
        server.register_idle_fn({
            let ticks = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
            Box::new(move |_since| {
                ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst) >= 20
            })
        });
        server.start();
        let root = tempfile::tempdir().unwrap();
        let directory = DirectoryHandler::new(root.path(), "player", 1).unwrap();
        let rpc = server.create_client(EntityKind::Player, 1, Some(0));
        let console = PlayerConsoleImpl::new(BaseConsole::new(rpc, directory, "player-1-clone-0".to_string()), false);

        let id = console.add_object(NewObjectArgs {
            data: vec![1, 2, 3],
            ..NewObjectArgs::default()
        }).unwrap();
        assert_eq!(id, 9);

        server.join().unwrap();
    }

    #[test]
    fn create_temp_directory_allocates_under_entity_base() {
        let (mut server, directory) = spawn_echo_server();
        let rpc = server.create_client(EntityKind::Npc, 1, None);
        let console = NpcConsole::new(BaseConsole::new(rpc, directory, "npc-1".to_string()));

        let dir = console.create_temp_directory().unwrap();
        assert!(dir.is_dir());

        server.join().unwrap();
    }

    #[test]
    fn entity_display_matches_creator_convention() {
        let entity = Entity::new(0, EntityKind::Player, 1, Some(3));
        assert_eq!(entity.to_string(), "player-1-clone-3");
    }
}
