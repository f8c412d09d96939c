use std::any::Any;

/// Produces an owned copy of a state for command snapshots.
///
/// States that commands never read can keep the default, which opts them out
/// of snapshots entirely.
pub trait SnapshotClone {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        None
    }
}

/// A value stored in `StateCtx`, one instance per type.
pub trait State: Any + Send + SnapshotClone {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
