use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

/// Signal raised by whoever restores game state into a freshly loaded scene.
///
/// The loader only keeps a weak reference to the flag: the caller owns it,
/// and the loader never keeps it alive.
#[derive(Debug, Clone, Default)]
pub struct RestoreFlag(Arc<AtomicBool>);

impl RestoreFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_restored(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mark_restored(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub(crate) fn downgrade(&self) -> Weak<AtomicBool> {
        Arc::downgrade(&self.0)
    }
}

/// State of what the restore wait observed on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RestoreState {
    Pending,
    Restored,
    Dropped,
}

pub(crate) fn read_restore(flag: &Weak<AtomicBool>) -> RestoreState {
    match flag.upgrade() {
        Some(flag) if flag.load(Ordering::Acquire) => RestoreState::Restored,
        Some(_) => RestoreState::Pending,
        None => RestoreState::Dropped,
    }
}

/// The single pending load request of a [`SceneLoader`](super::SceneLoader).
#[derive(Debug, Default)]
pub struct LoadRequest {
    target: Option<String>,
    restore: Option<Weak<AtomicBool>>,
    in_progress: bool,
}

impl LoadRequest {
    /// Records a new request unless one is already running.
    ///
    /// Returns `false` and leaves the stored request untouched when busy.
    pub fn accept(&mut self, target: impl Into<String>, restore: Option<&RestoreFlag>) -> bool {
        if self.in_progress {
            return false;
        }
        self.in_progress = true;
        self.target = Some(target.into());
        self.restore = restore.map(|flag| {
            flag.reset();
            flag.downgrade()
        });
        true
    }

    pub fn clear(&mut self) {
        self.target = None;
        self.restore = None;
        self.in_progress = false;
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn has_restore_handle(&self) -> bool {
        self.restore.is_some()
    }

    pub(crate) fn restore_handle(&self) -> Option<Weak<AtomicBool>> {
        self.restore.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_is_dropped() {
        let mut request = LoadRequest::default();
        assert!(request.accept("Battle", None));
        assert!(!request.accept("Tabletop", None));
        assert_eq!(request.target(), Some("Battle"));
        assert!(request.in_progress());
    }

    #[test]
    fn accepting_resets_the_restore_flag() {
        let flag = RestoreFlag::new();
        flag.mark_restored();
        let mut request = LoadRequest::default();
        assert!(request.accept("Tabletop", Some(&flag)));
        assert!(!flag.is_restored());
        assert!(request.has_restore_handle());
    }

    #[test]
    fn dropped_request_leaves_foreign_flag_alone() {
        let first = RestoreFlag::new();
        let second = RestoreFlag::new();
        second.mark_restored();
        let mut request = LoadRequest::default();
        request.accept("Tabletop", Some(&first));
        assert!(!request.accept("Battle", Some(&second)));
        assert!(second.is_restored());
    }

    #[test]
    fn clear_frees_the_request() {
        let flag = RestoreFlag::new();
        let mut request = LoadRequest::default();
        request.accept("Tabletop", Some(&flag));
        request.clear();
        assert!(!request.in_progress());
        assert!(!request.has_restore_handle());
        assert_eq!(request.target(), None);
        assert!(request.accept("Battle", None));
    }

    #[test]
    fn restore_handle_does_not_keep_flag_alive() {
        let flag = RestoreFlag::new();
        let weak = flag.downgrade();
        assert_eq!(read_restore(&weak), RestoreState::Pending);
        flag.mark_restored();
        assert_eq!(read_restore(&weak), RestoreState::Restored);
        drop(flag);
        assert_eq!(read_restore(&weak), RestoreState::Dropped);
    }
}
