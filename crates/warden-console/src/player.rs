// SPDX-License-Identifier: Apache-2.0
//! Player console: full interest/parentage model plus the read/stream
//! surface only players get (§4.5, §6.1).

use crate::base::{to_console_error, BaseConsole, DEFAULT_TIMEOUT};
use crate::streams::{RpcObjectStream, RpcRecordStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use warden_analyzer::{
    ClonePhaseSink, Console, ConsoleError, NewObjectArgs, NoopPhaseSink, ObjectStream, ParentSelector, PlayerConsole,
    RecordStream,
};
use warden_blackboard::FileObject;
use warden_facts::Record;
use warden_rpc::{Command, CommandResult, StreamCommand};

fn to_rpc_selector(selector: ParentSelector) -> warden_rpc::ParentSelector {
    match selector {
        ParentSelector::Object(id) => warden_rpc::ParentSelector::Object(id),
        ParentSelector::Fact(id) => warden_rpc::ParentSelector::Fact(id),
        ParentSelector::Hyp(id) => warden_rpc::ParentSelector::Hyp(id),
    }
}

/// Console handed to one player clone. `tainted` reflects whether this
/// clone is handling a hypothesis delivery — it gates [`Console::add_fact`]
/// (§6.1).
pub struct PlayerConsoleImpl {
    base: BaseConsole,
    tainted: bool,
    phase_sink: Arc<dyn ClonePhaseSink>,
}

impl PlayerConsoleImpl {
    /// Wraps `base` as a player console for a clone whose taint state is
    /// `tainted`, with no clone-phase tracking (`phase_sink` is a no-op).
    #[must_use]
    pub fn new(base: BaseConsole, tainted: bool) -> Self {
        Self::with_phase_sink(base, tainted, Arc::new(NoopPhaseSink))
    }

    /// Wraps `base` as a player console whose blocking calls report
    /// `waiting`/`running` transitions to `phase_sink` (the owning
    /// clone's tracker entry).
    #[must_use]
    pub const fn with_phase_sink(base: BaseConsole, tainted: bool, phase_sink: Arc<dyn ClonePhaseSink>) -> Self {
        Self { base, tainted, phase_sink }
    }
}

impl Console for PlayerConsoleImpl {
    fn add_object(&self, args: NewObjectArgs) -> Result<u64, ConsoleError> {
        self.base.add_object(args)
    }

    fn add_fact(&self, fact: Record) -> Result<u64, ConsoleError> {
        if self.tainted {
            return Err(ConsoleError::YesReallyRequired);
        }
        self.base.add_record(fact, false, true)
    }

    fn add_hyp(&self, hyp: Record) -> Result<u64, ConsoleError> {
        self.base.add_record(hyp, true, true)
    }

    fn print(&self, message: &str) {
        self.base.print(message);
    }

    fn create_temp_directory(&self) -> Result<PathBuf, ConsoleError> {
        self.base.create_temp_directory()
    }
}

impl PlayerConsole for PlayerConsoleImpl {
    fn get_object(&self, id: u64) -> Result<Option<FileObject>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(Command::GetObject { id }, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::MaybeObject(object) => Ok(object),
            _ => Err(ConsoleError::Remote("malformed getObject response".to_string())),
        }
    }

    fn get_all_objects(&self) -> Result<Vec<FileObject>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(Command::GetAllObjects, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::Objects(objects) => Ok(objects),
            _ => Err(ConsoleError::Remote("malformed getAllObjects response".to_string())),
        }
    }

    fn get_fact(&self, id: u64) -> Result<Option<Record>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(Command::GetFact { id }, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::MaybeRecord(record) => Ok(record),
            _ => Err(ConsoleError::Remote("malformed getFact response".to_string())),
        }
    }

    fn get_all_facts(&self, kinds: &[String]) -> Result<Vec<Record>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(
                Command::GetAllFacts { kinds: kinds.to_vec() },
                Some(DEFAULT_TIMEOUT),
            )
            .map_err(to_console_error)?;
        match result {
            CommandResult::Records(records) => Ok(records),
            _ => Err(ConsoleError::Remote("malformed getAllFacts response".to_string())),
        }
    }

    fn get_hyp(&self, id: u64) -> Result<Option<Record>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(Command::GetHyp { id }, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::MaybeRecord(record) => Ok(record),
            _ => Err(ConsoleError::Remote("malformed getHyp response".to_string())),
        }
    }

    fn get_all_hyps(&self, kinds: &[String]) -> Result<Vec<Record>, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(
                Command::GetAllHyps { kinds: kinds.to_vec() },
                Some(DEFAULT_TIMEOUT),
            )
            .map_err(to_console_error)?;
        match result {
            CommandResult::Records(records) => Ok(records),
            _ => Err(ConsoleError::Remote("malformed getAllHyps response".to_string())),
        }
    }

    fn wait_till_fact(
        &self,
        kinds: &[String],
        last_fact: Option<u64>,
        timeout: Option<Duration>,
    ) -> Result<Record, ConsoleError> {
        self.phase_sink.set_waiting();
        let result = self
            .base
            .rpc
            .send_and_wait(
                Command::WaitTillFact {
                    kinds: kinds.to_vec(),
                    last_fact,
                },
                timeout,
            )
            .map_err(to_console_error);
        self.phase_sink.set_running();
        match result? {
            CommandResult::MaybeRecord(Some(record)) => Ok(record),
            _ => Err(ConsoleError::Remote("malformed waitTillFact response".to_string())),
        }
    }

    fn wait_on_facts(&self, kinds: &[String], only_latest: bool) -> Result<Box<dyn RecordStream>, ConsoleError> {
        let handle = self
            .base
            .rpc
            .start_stream(StreamCommand::FactStream {
                kinds: kinds.to_vec(),
                only_latest,
            })
            .map_err(to_console_error)?;
        Ok(Box::new(RpcRecordStream::new(handle, Arc::clone(&self.phase_sink))))
    }

    fn wait_on_hyps(&self, kinds: &[String], only_latest: bool) -> Result<Box<dyn RecordStream>, ConsoleError> {
        let handle = self
            .base
            .rpc
            .start_stream(StreamCommand::HypStream {
                kinds: kinds.to_vec(),
                only_latest,
            })
            .map_err(to_console_error)?;
        Ok(Box::new(RpcRecordStream::new(handle, Arc::clone(&self.phase_sink))))
    }

    fn wait_on_child_facts(
        &self,
        parent: ParentSelector,
        kinds: &[String],
        only_latest: bool,
    ) -> Result<Box<dyn RecordStream>, ConsoleError> {
        let handle = self
            .base
            .rpc
            .start_stream(StreamCommand::ChildFactStream {
                parent: to_rpc_selector(parent),
                kinds: kinds.to_vec(),
                only_latest,
            })
            .map_err(to_console_error)?;
        Ok(Box::new(RpcRecordStream::new(handle, Arc::clone(&self.phase_sink))))
    }

    fn wait_on_child_hyps(
        &self,
        parent: ParentSelector,
        kinds: &[String],
        only_latest: bool,
    ) -> Result<Box<dyn RecordStream>, ConsoleError> {
        let handle = self
            .base
            .rpc
            .start_stream(StreamCommand::ChildHypStream {
                parent: to_rpc_selector(parent),
                kinds: kinds.to_vec(),
                only_latest,
            })
            .map_err(to_console_error)?;
        Ok(Box::new(RpcRecordStream::new(handle, Arc::clone(&self.phase_sink))))
    }

    fn wait_on_child_objects(&self, parent: ParentSelector, only_latest: bool) -> Result<Box<dyn ObjectStream>, ConsoleError> {
        let handle = self
            .base
            .rpc
            .start_stream(StreamCommand::ChildObjectStream {
                parent: to_rpc_selector(parent),
                only_latest,
            })
            .map_err(to_console_error)?;
        Ok(Box::new(RpcObjectStream::new(handle, Arc::clone(&self.phase_sink))))
    }

    fn promote(&self, hyp_id: u64) -> Result<Record, ConsoleError> {
        let result = self
            .base
            .rpc
            .send_and_wait(Command::Promote { hyp_id }, Some(DEFAULT_TIMEOUT))
            .map_err(to_console_error)?;
        match result {
            CommandResult::MaybeRecord(Some(record)) => Ok(record),
            _ => Err(ConsoleError::Remote("malformed promote response".to_string())),
        }
    }

    fn add_fact_tainted(&self, fact: Record, yesreally: bool) -> Result<u64, ConsoleError> {
        if self.tainted && !yesreally {
            return Err(ConsoleError::YesReallyRequired);
        }
        self.base.add_record(fact, false, true)
    }
}
