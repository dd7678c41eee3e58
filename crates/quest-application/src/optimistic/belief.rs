use crate::call::remote_call;
use crate::optimistic::{Mutation, PendingSet};
use crate::store::EntityStore;
use quest_core::proof::{BeliefState, ProofDetails, ProofPatch};
use quest_core::{Entity, QuestError, RemoteClient, Result};
use std::sync::Arc;
use std::time::Duration;

/// Result of a belief toggle, as seen by the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The server accepted; the store holds this state.
    Confirmed(BeliefState),
    /// The server reported a state different from the optimistic one and it was adopted.
    Reconciled {
        intended: BeliefState,
        server: BeliefState,
    },
    /// The call failed; the exact pre-toggle state was restored.
    RolledBack {
        restored: BeliefState,
        error: QuestError,
    },
    /// A toggle for this proof is already in flight; nothing was done.
    InFlight,
}

/// Optimistic endorsement toggle for proofs.
///
/// At most one toggle per proof is in flight. The store is updated before the
/// remote call and rolled back to the captured snapshot if the call fails.
#[derive(Clone)]
pub struct BeliefToggle {
    remote: Arc<dyn RemoteClient>,
    pending: PendingSet,
    timeout: Duration,
}

impl BeliefToggle {
    pub fn new(remote: Arc<dyn RemoteClient>, pending: PendingSet, timeout: Duration) -> Self {
        Self {
            remote,
            pending,
            timeout,
        }
    }

    pub fn is_pending(&self, proof_id: &str) -> bool {
        self.pending.is_pending(proof_id)
    }

    /// Flips the current user's belief in `proof_id` inside `store`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::NotFound` if the proof is not in the store. Remote
    /// failures are not errors here: they come back as `ToggleOutcome::RolledBack`.
    pub async fn toggle(
        &self,
        store: &EntityStore<ProofDetails>,
        proof_id: &str,
    ) -> Result<ToggleOutcome> {
        let Some(_pending) = self.pending.try_acquire(proof_id) else {
            tracing::debug!("[BeliefToggle] Toggle for {} already in flight", proof_id);
            return Ok(ToggleOutcome::InFlight);
        };

        let mutation = store
            .update_with(proof_id, |proof| {
                let previous = proof.belief();
                let intended = previous.toggled();
                proof.apply_patch(&ProofPatch::belief(intended));
                Mutation { previous, intended }
            })
            .await
            .ok_or_else(|| QuestError::not_found(ProofDetails::ENTITY_TYPE, proof_id))?;

        let result =
            remote_call("toggle_belief", self.timeout, self.remote.toggle_belief(proof_id)).await;

        match result {
            Ok(None) => Ok(ToggleOutcome::Confirmed(mutation.intended)),
            Ok(Some(server)) if server == mutation.intended => {
                Ok(ToggleOutcome::Confirmed(server))
            }
            Ok(Some(server)) => {
                tracing::info!(
                    "[BeliefToggle] Server state for {} differs from optimistic state ({:?} vs {:?}), adopting server",
                    proof_id,
                    server,
                    mutation.intended
                );
                store.patch(proof_id, &ProofPatch::belief(server)).await;
                Ok(ToggleOutcome::Reconciled {
                    intended: mutation.intended,
                    server,
                })
            }
            Err(error) => {
                tracing::warn!(
                    "[BeliefToggle] Toggle for {} failed, restoring {:?}: {}",
                    proof_id,
                    mutation.previous,
                    error
                );
                store
                    .patch(proof_id, &ProofPatch::belief(mutation.previous))
                    .await;
                Ok(ToggleOutcome::RolledBack {
                    restored: mutation.previous,
                    error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockRemote, proof};
    use quest_core::ErrorCode;

    struct Fixture {
        remote: Arc<MockRemote>,
        store: Arc<EntityStore<ProofDetails>>,
        toggle: BeliefToggle,
    }

    async fn fixture(is_believed: bool, count: u32) -> Fixture {
        let remote = Arc::new(MockRemote::new());
        let store = Arc::new(EntityStore::new(true));
        store
            .refresh_with(async { Ok(vec![proof("p1", is_believed, count)]) })
            .await
            .unwrap();
        let toggle = BeliefToggle::new(remote.clone(), PendingSet::new(), Duration::from_secs(5));
        Fixture {
            remote,
            store,
            toggle,
        }
    }

    async fn belief_of(store: &EntityStore<ProofDetails>) -> BeliefState {
        store.get_by_id("p1").await.unwrap().belief()
    }

    #[tokio::test]
    async fn test_optimistic_value_visible_before_settle() {
        let f = fixture(false, 3).await;
        let gate = f.remote.belief.push_gated();

        let task = tokio::spawn({
            let (store, toggle) = (f.store.clone(), f.toggle.clone());
            async move { toggle.toggle(&store, "p1").await.unwrap() }
        });
        tokio::task::yield_now().await;

        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 4));
        assert!(f.toggle.is_pending("p1"));

        gate.send(Ok(None)).unwrap();
        assert_eq!(
            task.await.unwrap(),
            ToggleOutcome::Confirmed(BeliefState::new(true, 4))
        );
        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 4));
        assert!(!f.toggle.is_pending("p1"));
    }

    #[tokio::test]
    async fn test_failure_restores_exact_snapshot() {
        let f = fixture(true, 7).await;
        f.remote
            .belief
            .push(Err(QuestError::remote(ErrorCode::DatabaseError, "")));

        let outcome = f.toggle.toggle(&f.store, "p1").await.unwrap();

        match outcome {
            ToggleOutcome::RolledBack { restored, error } => {
                assert_eq!(restored, BeliefState::new(true, 7));
                assert_eq!(error.code(), Some(ErrorCode::DatabaseError));
            }
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 7));
        assert!(!f.toggle.is_pending("p1"));
    }

    #[tokio::test]
    async fn test_rollback_does_not_recompute_from_intended() {
        // A zero count with is_believed set toggles to (false, 0); inverting
        // that would give (true, 1), not the snapshot.
        let f = fixture(true, 0).await;
        f.remote.belief.push(Err(QuestError::transport("offline")));

        f.toggle.toggle(&f.store, "p1").await.unwrap();

        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 0));
    }

    #[tokio::test]
    async fn test_second_toggle_while_pending_is_ignored() {
        let f = fixture(false, 3).await;
        let gate = f.remote.belief.push_gated();

        let first = tokio::spawn({
            let (store, toggle) = (f.store.clone(), f.toggle.clone());
            async move { toggle.toggle(&store, "p1").await.unwrap() }
        });
        tokio::task::yield_now().await;

        let second = f.toggle.toggle(&f.store, "p1").await.unwrap();
        assert_eq!(second, ToggleOutcome::InFlight);
        assert_eq!(f.remote.belief.calls(), 1);
        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 4));

        gate.send(Ok(None)).unwrap();
        first.await.unwrap();
        assert!(!f.toggle.is_pending("p1"));
    }

    #[tokio::test]
    async fn test_server_state_is_adopted() {
        let f = fixture(false, 3).await;
        f.remote.belief.push(Ok(Some(BeliefState::new(true, 10))));

        let outcome = f.toggle.toggle(&f.store, "p1").await.unwrap();

        assert_eq!(
            outcome,
            ToggleOutcome::Reconciled {
                intended: BeliefState::new(true, 4),
                server: BeliefState::new(true, 10),
            }
        );
        assert_eq!(belief_of(&f.store).await, BeliefState::new(true, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_rolls_back() {
        let f = fixture(false, 3).await;
        let _gate = f.remote.belief.push_gated();

        let outcome = f.toggle.toggle(&f.store, "p1").await.unwrap();

        match outcome {
            ToggleOutcome::RolledBack { error, .. } => assert!(error.is_timeout()),
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(belief_of(&f.store).await, BeliefState::new(false, 3));
        assert!(!f.toggle.is_pending("p1"));
    }

    #[tokio::test]
    async fn test_unknown_proof_is_not_found_and_not_left_pending() {
        let f = fixture(false, 3).await;

        let err = f.toggle.toggle(&f.store, "ghost").await.unwrap_err();

        assert!(err.is_not_found());
        assert!(!f.toggle.is_pending("ghost"));
        assert_eq!(f.remote.belief.calls(), 0);
    }
}
