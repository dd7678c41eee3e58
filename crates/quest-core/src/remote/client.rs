//! The remote command boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::lobby::{Lobby, LobbyDetails, LobbyFeedItem, LobbyMember, NewLobby};
use crate::proof::{
    BeliefState, Pagination, ProofDetails, ProofFeedPage, ProofUpload, SubmitProofResponse,
};
use crate::quest::QuestEntry;
use crate::session::{LoginRequest, RegisterRequest, UserSession};

/// An abstract request/response channel to the quest backend.
///
/// Every call is asynchronous and may fail. Implementations translate wire
/// error bodies into `QuestError::Remote` and network failures into
/// `QuestError::Transport`. Nothing is streamed or pushed.
///
/// # Implementation Notes
///
/// Implementations own the credentials (access and refresh tokens); callers
/// only ever see [`UserSession`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Lists today's quest entries for the current user.
    async fn list_daily_quests(&self) -> Result<Vec<QuestEntry>>;

    /// Submits a proof with its binary attachments as one logical unit.
    async fn submit_proof(&self, upload: ProofUpload) -> Result<SubmitProofResponse>;

    /// Flips the current user's endorsement of a proof.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: the server reported the authoritative belief state
    /// - `Ok(None)`: the server accepted the toggle without reporting a state
    async fn toggle_belief(&self, proof_id: &str) -> Result<Option<BeliefState>>;

    /// Fetches one page of the community feed.
    async fn get_proof_feed(&self, page: Pagination) -> Result<ProofFeedPage>;

    /// Fetches the current user's own published proofs.
    async fn get_my_journal(&self) -> Result<Vec<ProofDetails>>;

    /// Fetches another user's published proofs.
    async fn get_user_journal(&self, user_id: &str) -> Result<Vec<ProofDetails>>;

    /// Fetches a single proof as the current user sees it.
    async fn get_proof_details(&self, proof_id: &str) -> Result<ProofDetails>;

    /// Asks the backend who the current user is.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))`: authenticated
    /// - `Ok(None)`: no valid session
    async fn get_current_session(&self) -> Result<Option<UserSession>>;

    async fn login(&self, request: LoginRequest) -> Result<UserSession>;

    async fn register(&self, request: RegisterRequest) -> Result<UserSession>;

    /// Invalidates the current session remotely.
    async fn logout(&self) -> Result<()>;

    async fn list_lobbies(&self) -> Result<Vec<LobbyFeedItem>>;

    async fn create_lobby(&self, lobby: NewLobby) -> Result<Lobby>;

    async fn join_lobby(&self, lobby_id: &str) -> Result<LobbyMember>;

    async fn get_lobby_details(&self, lobby_id: &str) -> Result<LobbyDetails>;

    async fn get_lobby_members_count(&self, lobby_id: &str) -> Result<u32>;
}
