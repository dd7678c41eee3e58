//! Optimistic mutation protocols on top of the entity stores.

mod belief;
mod submission;

pub use belief::{BeliefToggle, ToggleOutcome};
pub use submission::{
    DraftAttachment, PreviewHandle, PreviewRegistry, ProofDraft, ProofSubmitter, SubmissionOutcome,
    SubmissionPhase,
};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// The two values an optimistic mutation moves between.
///
/// `previous` is captured before the first suspension point and is restored
/// verbatim on failure; it is never recomputed by inverting `intended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation<S> {
    pub previous: S,
    pub intended: S,
}

/// Ids that have a mutation in flight.
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as pending. Returns `None` if it already is.
    ///
    /// The flag is released when the returned guard drops, on every exit path.
    pub fn try_acquire(&self, id: &str) -> Option<PendingGuard> {
        if !self.lock().insert(id.to_string()) {
            return None;
        }
        Some(PendingGuard {
            set: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds one id in a [`PendingSet`] until dropped.
#[derive(Debug)]
pub struct PendingGuard {
    set: PendingSet,
    id: String,
}

impl PendingGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_guard_releases_on_drop() {
        let pending = PendingSet::new();

        let guard = pending.try_acquire("p1").unwrap();
        assert!(pending.is_pending("p1"));
        assert!(pending.try_acquire("p1").is_none());
        assert!(pending.try_acquire("p2").is_some());

        drop(guard);
        assert!(!pending.is_pending("p1"));
        assert!(pending.is_empty());
    }
}
