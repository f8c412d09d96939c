use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

use crate::{LatestOnlyUpdater, TaskHandle, TaskId, Updater, updater::StateUpdate};

/// Update channel plus per-command task bookkeeping.
#[derive(Debug)]
pub struct StateRuntime {
    send: Sender<StateUpdate>,
    recv: Receiver<StateUpdate>,

    latest: BTreeMap<TypeId, Arc<AtomicU64>>,
    running: BTreeMap<TypeId, TaskHandle>,
}

impl Default for StateRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRuntime {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            send,
            recv,
            latest: BTreeMap::new(),
            running: BTreeMap::new(),
        }
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    pub(crate) fn receiver(&self) -> &Receiver<StateUpdate> {
        &self.recv
    }

    /// Start a new generation for `command`, cancelling the run it replaces.
    pub(crate) fn supersede(&mut self, command: TypeId) -> (TaskHandle, LatestOnlyUpdater) {
        let latest = self
            .latest
            .entry(command)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        let generation = latest.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(previous) = self.running.remove(&command) {
            previous.cancel();
        }

        let handle = TaskHandle::new(
            TaskId::new(command, generation),
            CancellationToken::new(),
        );
        self.running.insert(command, handle.clone());

        (
            handle,
            LatestOnlyUpdater::new(self.updater(), generation, latest),
        )
    }

    /// A run that does not replace earlier runs of the same command.
    pub(crate) fn concurrent(&self, command: TypeId) -> (TaskHandle, LatestOnlyUpdater) {
        let handle = TaskHandle::new(TaskId::new(command, 0), CancellationToken::new());
        (handle, LatestOnlyUpdater::unguarded(self.updater()))
    }

    /// Cancel the latest run of `command` and make its updater stale.
    /// Returns `false` when nothing was running.
    pub(crate) fn retire(&mut self, command: TypeId) -> bool {
        if let Some(latest) = self.latest.get(&command) {
            latest.fetch_add(1, Ordering::AcqRel);
        }
        match self.running.remove(&command) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, handle) in std::mem::take(&mut self.running) {
            handle.cancel();
        }
    }
}
