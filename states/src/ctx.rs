use std::any::TypeId;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use log::{debug, error};
use tokio::task::JoinSet;

use crate::{Command, CommandSnapshot, Error, State, StateRuntime, Updater};

/// Owner of all states, registered commands and in-flight command tasks.
///
/// Reads are direct (`state`), synchronous writes go through `update`, and
/// asynchronous results arrive through `Updater`s and land on `sync_states`.
#[derive(Default)]
pub struct StateCtx {
    runtime: StateRuntime,

    states: BTreeMap<TypeId, Box<dyn State>>,
    commands: BTreeMap<TypeId, Arc<dyn Command>>,

    queue: VecDeque<TypeId>,
    tasks: JoinSet<()>,
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("states", &self.states.len())
            .field("commands", &self.commands.len())
            .field("queued", &self.queue.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the state of type `T`.
    pub fn add_state<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), Box::new(state));
    }

    pub fn state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found::<T>("StateCtx::state"))
    }

    pub fn state_mut<T: State>(&mut self) -> Result<&mut T, Error> {
        self.states
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| Error::state_not_found::<T>("StateCtx::state_mut"))
    }

    /// Run `f` against the stored `T` and return its result.
    pub fn update<T: State, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        self.state_mut::<T>().map(f)
    }

    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(TypeId::of::<C>(), Arc::new(command));
    }

    /// Queue `C` for the next `flush_commands`.
    pub fn enqueue_command<C: Command>(&mut self) -> Result<(), Error> {
        let id = TypeId::of::<C>();
        if !self.commands.contains_key(&id) {
            return Err(Error::command_not_found::<C>("StateCtx::enqueue_command"));
        }
        self.queue.push_back(id);
        Ok(())
    }

    /// Spawn every queued command onto the task set.
    ///
    /// Must be called from within a tokio runtime.
    pub fn flush_commands(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            let Some(command) = self.commands.get(&id).cloned() else {
                error!("StateCtx: queued command {id:?} is no longer registered");
                continue;
            };

            let snap = self.snapshot();
            let (handle, updater) = if command.supersedes_previous() {
                self.runtime.supersede(id)
            } else {
                self.runtime.concurrent(id)
            };

            debug!(
                "StateCtx: spawning command run (generation {})",
                handle.id().generation()
            );
            let future = command.run(snap, updater, handle.cancellation_token());
            self.tasks.spawn(future);
        }
    }

    /// Enqueue `C` and flush immediately.
    pub fn dispatch<C: Command>(&mut self) -> Result<(), Error> {
        self.enqueue_command::<C>()?;
        self.flush_commands();
        Ok(())
    }

    /// Cancel the in-flight run of a superseding command `C`; its later
    /// writes are dropped. Queued, unflushed runs of `C` are removed too.
    pub fn cancel_command<C: Command>(&mut self) -> bool {
        let id = TypeId::of::<C>();
        self.queue.retain(|queued| *queued != id);
        let retired = self.runtime.retire(id);
        if retired {
            debug!("StateCtx: cancelled running {}", std::any::type_name::<C>());
        }
        retired
    }

    /// Apply every queued update. Returns how many were applied.
    pub fn sync_states(&mut self) -> usize {
        let mut applied = 0;
        for update in self.runtime.receiver().try_iter() {
            match self.states.get_mut(&update.target) {
                Some(state) => {
                    (update.apply)(state.as_any_mut());
                    applied += 1;
                }
                None => error!(
                    "StateCtx: update for unregistered state {} dropped",
                    update.target_name
                ),
            }
        }
        applied
    }

    pub fn updater(&self) -> Updater {
        self.runtime.updater()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Cancel and abort all running commands, then wait for them to finish.
    pub async fn shutdown(&mut self) {
        self.queue.clear();
        self.runtime.cancel_all();
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snap = CommandSnapshot::new();
        for (id, state) in &self.states {
            if let Some(cloned) = state.clone_boxed() {
                snap.insert_cloned(*id, cloned);
            }
        }
        snap
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{CommandFuture, LatestOnlyUpdater, SnapshotClone};

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct Input {
        delay_ms: u64,
        value: u32,
    }

    impl SnapshotClone for Input {
        fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
            Some(Box::new(self.clone()))
        }
    }

    impl State for Input {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Debug, Default)]
    struct Output {
        values: Vec<u32>,
    }

    impl SnapshotClone for Output {}

    impl State for Output {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Records `Input.value` after `Input.delay_ms`, ignoring cancellation.
    struct Record {
        latest_only: bool,
    }

    impl Command for Record {
        fn run(
            &self,
            snap: CommandSnapshot,
            updater: LatestOnlyUpdater,
            _cancel: CancellationToken,
        ) -> CommandFuture {
            let input = snap.state::<Input>().cloned();
            Box::pin(async move {
                let Ok(input) = input else {
                    return;
                };
                tokio::time::sleep(Duration::from_millis(input.delay_ms)).await;
                updater.update::<Output>(move |out| out.values.push(input.value));
            })
        }

        fn supersedes_previous(&self) -> bool {
            self.latest_only
        }
    }

    async fn wait_all(ctx: &mut StateCtx) {
        while ctx.task_set_mut().join_next().await.is_some() {
            ctx.sync_states();
        }
        ctx.sync_states();
    }

    fn setup(latest_only: bool) -> StateCtx {
        let mut ctx = StateCtx::new();
        ctx.add_state(Input::default());
        ctx.add_state(Output::default());
        ctx.record_command(Record { latest_only });
        ctx
    }

    #[test]
    fn update_returns_closure_result() {
        let mut ctx = setup(false);
        let doubled = ctx
            .update::<Input, u32>(|input| {
                input.value = 21;
                input.value * 2
            })
            .unwrap();
        assert_eq!(doubled, 42);
        assert_eq!(ctx.state::<Input>().unwrap().value, 21);
    }

    #[test]
    fn missing_state_and_command_are_errors() {
        let mut ctx = StateCtx::new();
        assert!(matches!(
            ctx.state::<Input>(),
            Err(Error::StateNotFound { .. })
        ));
        assert!(matches!(
            ctx.enqueue_command::<Record>(),
            Err(Error::CommandNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn superseded_run_cannot_write() {
        let mut ctx = setup(true);

        ctx.update::<Input, _>(|input| *input = Input { delay_ms: 80, value: 1 })
            .unwrap();
        ctx.dispatch::<Record>().unwrap();

        ctx.update::<Input, _>(|input| *input = Input { delay_ms: 0, value: 2 })
            .unwrap();
        ctx.dispatch::<Record>().unwrap();

        assert_eq!(ctx.task_count(), 2);
        wait_all(&mut ctx).await;

        assert_eq!(ctx.state::<Output>().unwrap().values, vec![2]);
    }

    #[tokio::test]
    async fn concurrent_runs_all_write() {
        let mut ctx = setup(false);

        ctx.update::<Input, _>(|input| *input = Input { delay_ms: 40, value: 1 })
            .unwrap();
        ctx.dispatch::<Record>().unwrap();

        ctx.update::<Input, _>(|input| *input = Input { delay_ms: 0, value: 2 })
            .unwrap();
        ctx.dispatch::<Record>().unwrap();

        wait_all(&mut ctx).await;

        assert_eq!(ctx.state::<Output>().unwrap().values, vec![2, 1]);
    }

    #[tokio::test]
    async fn cancelled_command_cannot_write() {
        let mut ctx = setup(true);

        ctx.update::<Input, _>(|input| *input = Input { delay_ms: 50, value: 7 })
            .unwrap();
        ctx.dispatch::<Record>().unwrap();

        assert!(ctx.cancel_command::<Record>());
        assert!(!ctx.cancel_command::<Record>());
        wait_all(&mut ctx).await;

        assert!(ctx.state::<Output>().unwrap().values.is_empty());
    }

    #[tokio::test]
    async fn shutdown_drains_tasks() {
        let mut ctx = setup(false);
        ctx.update::<Input, _>(|input| input.delay_ms = 10_000).unwrap();
        ctx.dispatch::<Record>().unwrap();

        ctx.shutdown().await;

        assert_eq!(ctx.task_count(), 0);
        assert_eq!(ctx.sync_states(), 0);
    }
}
