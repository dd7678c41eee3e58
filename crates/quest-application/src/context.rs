//! Composition root of the application layer.

use crate::optimistic::{BeliefToggle, PendingSet, PreviewRegistry, ProofDraft, ProofSubmitter};
use crate::session::SessionGate;
use crate::store::{LobbyStore, ProofListing, ProofStore, QuestStore};
use quest_core::RemoteClient;
use quest_core::config::ClientConfig;
use quest_core::proof::AttachmentLoader;
use std::sync::Arc;
use std::time::Duration;

/// Every store and protocol the client needs, wired to one remote.
///
/// The feed and every journal share one pending set, so a proof that shows up
/// in more than one list cannot be toggled twice at once.
pub struct AppContext {
    pub session: SessionGate,
    pub quests: Arc<QuestStore>,
    pub feed: ProofStore,
    pub journal: ProofStore,
    pub lobbies: LobbyStore,
    pub submitter: ProofSubmitter,
    previews: PreviewRegistry,
    remote: Arc<dyn RemoteClient>,
    beliefs: BeliefToggle,
    timeout: Duration,
    sequencing: bool,
}

impl AppContext {
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        loader: Arc<dyn AttachmentLoader>,
        config: &ClientConfig,
    ) -> Self {
        let timeout = config.request_timeout();
        let sequencing = config.refresh_sequencing;
        tracing::debug!(
            "[AppContext] Wiring stores (timeout={:?}, sequencing={})",
            timeout,
            sequencing
        );

        let beliefs = BeliefToggle::new(remote.clone(), PendingSet::new(), timeout);
        let quests = Arc::new(QuestStore::new(remote.clone(), timeout, sequencing));

        Self {
            session: SessionGate::new(remote.clone(), timeout),
            feed: ProofStore::new(
                ProofListing::Feed {
                    page_size: config.feed_page_size,
                },
                remote.clone(),
                beliefs.clone(),
                timeout,
                sequencing,
            ),
            journal: ProofStore::new(
                ProofListing::Journal,
                remote.clone(),
                beliefs.clone(),
                timeout,
                sequencing,
            ),
            lobbies: LobbyStore::new(remote.clone(), timeout, sequencing),
            submitter: ProofSubmitter::new(remote.clone(), loader, quests.clone(), timeout),
            quests,
            previews: PreviewRegistry::new(),
            remote,
            beliefs,
            timeout,
            sequencing,
        }
    }

    /// A store listing `user_id`'s published proofs.
    pub fn user_journal(&self, user_id: impl Into<String>) -> ProofStore {
        ProofStore::new(
            ProofListing::UserJournal {
                user_id: user_id.into(),
            },
            self.remote.clone(),
            self.beliefs.clone(),
            self.timeout,
            self.sequencing,
        )
    }

    /// An empty draft whose previews are tracked by this context.
    pub fn new_draft(&self) -> ProofDraft {
        ProofDraft::new(self.previews.clone())
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }
}
