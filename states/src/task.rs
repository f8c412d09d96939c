//! Identity and cancellation for spawned command runs.
//!
//! - `TaskId`: the command type plus a generation counter
//! - `TaskHandle`: a `TaskId` paired with a `CancellationToken`
//!
//! Commands that supersede earlier runs (a page fetch replacing the fetch of
//! the page the user just left) get a fresh generation on every flush; the
//! previous run's handle is cancelled and its updater turns stale.

use std::any::TypeId;

use tokio_util::sync::CancellationToken;

/// Unique identifier for a spawned command run.
///
/// Runs of commands that do not supersede each other all share generation `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self {
            type_id,
            generation,
        }
    }

    /// The `TypeId` of the command that spawned the run.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Higher generations were flushed later.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to a spawned run with cooperative cancellation.
///
/// Cancelling does not abort the future; the command observes the token
/// (usually through `tokio::select!`) and returns early.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// A clone of the token, handed to the command's future.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
