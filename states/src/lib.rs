//! State runtime for the user administration core.
//!
//! - `State`: typed values owned by a `StateCtx`
//! - `Command`: manual-only async work spawned on the context's task set
//! - `Updater` / `LatestOnlyUpdater`: how command results flow back in
//!
//! A UI layer owns one `StateCtx`, reads states to render, mutates them only
//! through `update` or commands, and calls `sync_states` once per frame.

mod command;
mod ctx;
mod error;
mod runtime;
mod snapshot;
mod state;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use ctx::StateCtx;
pub use error::Error;
pub use runtime::StateRuntime;
pub use snapshot::CommandSnapshot;
pub use state::{SnapshotClone, State};
pub use task::{TaskHandle, TaskId};
pub use updater::{LatestOnlyUpdater, Updater};
