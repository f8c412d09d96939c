//! Channel-backed writers used by commands to change states.
//!
//! Writes are queued and only become visible after `StateCtx::sync_states()`,
//! which keeps every mutation on the thread that owns the context.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;
use log::{debug, warn};

use crate::State;

type Apply = Box<dyn FnOnce(&mut dyn Any) + Send>;

/// A queued write against one state type.
pub struct StateUpdate {
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) apply: Apply,
}

impl std::fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateUpdate")
            .field("target", &self.target_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Updater {
    send: Sender<StateUpdate>,
}

impl Updater {
    pub(crate) fn new(send: Sender<StateUpdate>) -> Self {
        Self { send }
    }

    /// Replace the stored `T` wholesale.
    pub fn set<T: State>(&self, value: T) {
        self.update::<T>(move |state| *state = value);
    }

    /// Mutate the stored `T` in place on the next sync.
    pub fn update<T: State>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        let apply: Apply = Box::new(move |any: &mut dyn Any| {
            if let Some(state) = any.downcast_mut::<T>() {
                f(state);
            }
        });
        let update = StateUpdate {
            target: TypeId::of::<T>(),
            target_name: type_name::<T>(),
            apply,
        };
        if self.send.send(update).is_err() {
            warn!(
                "Updater: state context dropped, discarding update for {}",
                type_name::<T>()
            );
        }
    }
}

/// An `Updater` that goes quiet once a newer run of the same command exists.
///
/// Commands that declare `supersedes_previous()` get a generation number at
/// flush time. Writes from a run whose generation is no longer the latest are
/// dropped, so a slow response can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct LatestOnlyUpdater {
    inner: Updater,
    generation: u64,
    latest: Option<Arc<AtomicU64>>,
}

impl LatestOnlyUpdater {
    /// An updater bound to `generation`, compared against `latest` on every write.
    pub fn new(inner: Updater, generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self {
            inner,
            generation,
            latest: Some(latest),
        }
    }

    /// An updater that never considers itself stale.
    pub fn unguarded(inner: Updater) -> Self {
        Self {
            inner,
            generation: 0,
            latest: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        match &self.latest {
            Some(latest) => latest.load(Ordering::Acquire) == self.generation,
            None => true,
        }
    }

    pub fn set<T: State>(&self, value: T) {
        if self.is_current() {
            self.inner.set(value);
        } else {
            debug!(
                "LatestOnlyUpdater: dropping stale set for {} (generation {})",
                type_name::<T>(),
                self.generation
            );
        }
    }

    pub fn update<T: State>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        if self.is_current() {
            self.inner.update(f);
        } else {
            debug!(
                "LatestOnlyUpdater: dropping stale update for {} (generation {})",
                type_name::<T>(),
                self.generation
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotClone;

    #[derive(Debug, Default)]
    struct Label(String);

    impl SnapshotClone for Label {}

    impl State for Label {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn apply_all(recv: &flume::Receiver<StateUpdate>, label: &mut Label) {
        for update in recv.try_iter() {
            assert_eq!(update.target, TypeId::of::<Label>());
            (update.apply)(label.as_any_mut());
        }
    }

    #[test]
    fn set_and_update_are_applied_in_order() {
        let (send, recv) = flume::unbounded();
        let updater = Updater::new(send);

        updater.set(Label("a".to_owned()));
        updater.update::<Label>(|label| label.0.push('b'));

        let mut label = Label::default();
        apply_all(&recv, &mut label);
        assert_eq!(label.0, "ab");
    }

    #[test]
    fn stale_generation_is_dropped() {
        let (send, recv) = flume::unbounded();
        let latest = Arc::new(AtomicU64::new(1));
        let first = LatestOnlyUpdater::new(Updater::new(send.clone()), 1, latest.clone());

        latest.store(2, Ordering::Release);
        let second = LatestOnlyUpdater::new(Updater::new(send), 2, latest);

        second.set(Label("second".to_owned()));
        first.set(Label("first".to_owned()));

        assert!(!first.is_current());
        assert!(second.is_current());

        let mut label = Label::default();
        apply_all(&recv, &mut label);
        assert_eq!(label.0, "second");
    }

    #[test]
    fn unguarded_is_always_current() {
        let (send, _recv) = flume::unbounded();
        let updater = LatestOnlyUpdater::unguarded(Updater::new(send));
        assert!(updater.is_current());
        assert_eq!(updater.generation(), 0);
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let (send, recv) = flume::unbounded();
        drop(recv);
        Updater::new(send).set(Label("ignored".to_owned()));
    }
}
