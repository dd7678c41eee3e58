use super::{EntityStore, RefreshOutcome};
use crate::call::remote_call;
use crate::optimistic::{BeliefToggle, ToggleOutcome};
use quest_core::proof::{Pagination, ProofDetails};
use quest_core::{QuestError, RemoteClient, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Which proofs a [`ProofStore`] lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofListing {
    /// First page of the community feed.
    Feed { page_size: u32 },
    /// The current user's own proofs.
    Journal,
    /// Another user's published proofs.
    UserJournal { user_id: String },
}

/// A list of proofs, in server order, with optimistic belief toggles.
pub struct ProofStore {
    listing: ProofListing,
    proofs: EntityStore<ProofDetails>,
    remote: Arc<dyn RemoteClient>,
    beliefs: BeliefToggle,
    has_more: AtomicBool,
    timeout: Duration,
}

impl ProofStore {
    pub fn new(
        listing: ProofListing,
        remote: Arc<dyn RemoteClient>,
        beliefs: BeliefToggle,
        timeout: Duration,
        sequencing: bool,
    ) -> Self {
        Self {
            listing,
            proofs: EntityStore::new(sequencing),
            remote,
            beliefs,
            has_more: AtomicBool::new(false),
            timeout,
        }
    }

    pub fn listing(&self) -> &ProofListing {
        &self.listing
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        match &self.listing {
            ProofListing::Feed { page_size } => {
                let fetch = async {
                    let page = remote_call(
                        "get_proof_feed",
                        self.timeout,
                        self.remote.get_proof_feed(Pagination::first_page(*page_size)),
                    )
                    .await?;
                    Ok::<_, QuestError>((page.items, page.has_more))
                };
                self.proofs
                    .refresh_committing(fetch, |has_more| {
                        self.has_more.store(has_more, Ordering::Relaxed)
                    })
                    .await
            }
            ProofListing::Journal => {
                self.proofs
                    .refresh_with(remote_call(
                        "get_my_journal",
                        self.timeout,
                        self.remote.get_my_journal(),
                    ))
                    .await
            }
            ProofListing::UserJournal { user_id } => {
                self.proofs
                    .refresh_with(remote_call(
                        "get_user_journal",
                        self.timeout,
                        self.remote.get_user_journal(user_id),
                    ))
                    .await
            }
        }
    }

    /// Fetches one proof and overwrites the listed copy with it.
    ///
    /// A proof this store does not list is returned but not added. The
    /// listed copy is left alone while a belief toggle for it is pending.
    pub async fn reload(&self, proof_id: &str) -> Result<ProofDetails> {
        let fresh = remote_call(
            "get_proof_details",
            self.timeout,
            self.remote.get_proof_details(proof_id),
        )
        .await?;
        let replaced = self
            .proofs
            .update_with(proof_id, |record| {
                if self.beliefs.is_pending(proof_id) {
                    return false;
                }
                *record = fresh.clone();
                true
            })
            .await;
        if replaced == Some(false) {
            tracing::debug!("[ProofStore] Toggle pending for {}, not overwriting", proof_id);
        }
        Ok(fresh)
    }

    /// Whether the server has proofs beyond the loaded feed page.
    pub fn has_more(&self) -> bool {
        self.has_more.load(Ordering::Relaxed)
    }

    pub async fn proofs(&self) -> Vec<ProofDetails> {
        self.proofs.list().await
    }

    pub async fn get_by_id(&self, proof_id: &str) -> Option<ProofDetails> {
        self.proofs.get_by_id(proof_id).await
    }

    pub async fn toggle_belief(&self, proof_id: &str) -> Result<ToggleOutcome> {
        self.beliefs.toggle(&self.proofs, proof_id).await
    }

    pub fn is_toggle_pending(&self, proof_id: &str) -> bool {
        self.beliefs.is_pending(proof_id)
    }

    pub fn entries(&self) -> &EntityStore<ProofDetails> {
        &self.proofs
    }
}
