use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, LatestOnlyUpdater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A manual-only unit of work, the only place side effects (network IO) happen.
///
/// `run` receives owned snapshots of the registered states, returns a future
/// that is spawned onto the context's task set, and reports results through
/// the updater.
pub trait Command: Any + Send + Sync {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture;

    /// When `true`, flushing this command cancels the previous run and makes
    /// that run's updater stale.
    fn supersedes_previous(&self) -> bool {
        false
    }
}
