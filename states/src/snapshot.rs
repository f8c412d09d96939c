use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;

use crate::{Error, State};

/// Owned copies of every snapshot-able state, taken when a command is flushed.
///
/// Commands run detached from `StateCtx`, so they read inputs from here and
/// write results back through their updater.
#[derive(Default)]
pub struct CommandSnapshot {
    states: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl std::fmt::Debug for CommandSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSnapshot")
            .field("states", &self.states.len())
            .finish()
    }
}

impl CommandSnapshot {
    pub fn new() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    pub fn insert_cloned(&mut self, id: TypeId, value: Box<dyn Any + Send>) {
        self.states.insert(id, value);
    }

    pub fn contains<T: State>(&self) -> bool {
        self.states.contains_key(&TypeId::of::<T>())
    }

    /// Borrow the snapshot of `T`.
    pub fn state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or_else(|| {
                Error::state_not_found::<T>(format!(
                    "{} has no snapshot (not registered or not SnapshotClone)",
                    type_name::<T>()
                ))
            })
    }
}
