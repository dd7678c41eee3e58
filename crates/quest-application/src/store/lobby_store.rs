use super::{EntityStore, RefreshOutcome};
use crate::call::remote_call;
use crate::optimistic::PendingSet;
use quest_core::lobby::{Lobby, LobbyDetails, LobbyFeedItem, LobbyMember, LobbyPatch, NewLobby};
use quest_core::{RemoteClient, Result};
use std::sync::Arc;
use std::time::Duration;

/// Lobbies visible to the current user.
///
/// Writes are confirmed, not optimistic: the list is refreshed after the
/// server accepts them.
pub struct LobbyStore {
    lobbies: EntityStore<LobbyFeedItem>,
    remote: Arc<dyn RemoteClient>,
    joining: PendingSet,
    timeout: Duration,
}

impl LobbyStore {
    pub fn new(remote: Arc<dyn RemoteClient>, timeout: Duration, sequencing: bool) -> Self {
        Self {
            lobbies: EntityStore::new(sequencing),
            remote,
            joining: PendingSet::new(),
            timeout,
        }
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.lobbies
            .refresh_with(remote_call(
                "list_lobbies",
                self.timeout,
                self.remote.list_lobbies(),
            ))
            .await
    }

    pub async fn lobbies(&self) -> Vec<LobbyFeedItem> {
        self.lobbies.list().await
    }

    pub async fn get_by_id(&self, lobby_id: &str) -> Option<LobbyFeedItem> {
        self.lobbies.get_by_id(lobby_id).await
    }

    /// Fetches one lobby with its member count.
    ///
    /// A listed lobby takes the fetched name, topic and description; its
    /// membership flag is left as listed.
    pub async fn details(&self, lobby_id: &str) -> Result<LobbyDetails> {
        let details = remote_call(
            "get_lobby_details",
            self.timeout,
            self.remote.get_lobby_details(lobby_id),
        )
        .await?;
        self.lobbies
            .update_with(lobby_id, |item| item.lobby = details.lobby.clone())
            .await;
        Ok(details)
    }

    pub async fn members_count(&self, lobby_id: &str) -> Result<u32> {
        remote_call(
            "get_lobby_members_count",
            self.timeout,
            self.remote.get_lobby_members_count(lobby_id),
        )
        .await
    }

    /// Validates and creates a lobby, then refreshes the list.
    pub async fn create_lobby(&self, lobby: NewLobby) -> Result<Lobby> {
        lobby.validate()?;
        let created = remote_call(
            "create_lobby",
            self.timeout,
            self.remote.create_lobby(lobby),
        )
        .await?;
        tracing::info!("[LobbyStore] Created lobby {}", created.ulid);
        self.refresh_after_write().await;
        Ok(created)
    }

    /// Joins `lobby_id`.
    ///
    /// Returns `Ok(None)` if a join for the same lobby is already in flight.
    pub async fn join_lobby(&self, lobby_id: &str) -> Result<Option<LobbyMember>> {
        let Some(_joining) = self.joining.try_acquire(lobby_id) else {
            tracing::debug!("[LobbyStore] Join for {} already in flight", lobby_id);
            return Ok(None);
        };
        let member = remote_call("join_lobby", self.timeout, self.remote.join_lobby(lobby_id))
            .await?;
        self.lobbies
            .patch(
                lobby_id,
                &LobbyPatch {
                    is_member: Some(true),
                },
            )
            .await;
        self.refresh_after_write().await;
        Ok(Some(member))
    }

    async fn refresh_after_write(&self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!("[LobbyStore] Refresh after write failed: {}", err);
        }
    }
}
