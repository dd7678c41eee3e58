//! Scripted `RemoteClient` and fixtures for unit tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quest_core::lobby::{Lobby, LobbyDetails, LobbyFeedItem, LobbyMember, NewLobby, Role};
use quest_core::proof::{
    AttachmentLoader, AttachmentSource, BeliefState, Pagination, ProofDetails, ProofFeedPage,
    ProofUpload, SubmitProofResponse,
};
use quest_core::quest::{Complexity, Quest, QuestEntry, QuestStatus};
use quest_core::session::{LoginRequest, RegisterRequest, UserSession};
use quest_core::{QuestError, RemoteClient, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

enum Reply<T> {
    Ready(Result<T>),
    Gated(oneshot::Receiver<Result<T>>),
}

/// Replies for one remote operation, consumed in call order.
///
/// When the queue is empty the fallback (if any) is cloned.
pub(crate) struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    fallback: Mutex<Option<Result<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, reply: Result<T>) {
        self.replies.lock().unwrap().push_back(Reply::Ready(reply));
    }

    /// Queues a reply that is held until the returned sender fires.
    pub(crate) fn push_gated(&self) -> oneshot::Sender<Result<T>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    pub(crate) fn set_fallback(&self, reply: Result<T>) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self, operation: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(QuestError::transport("gate dropped"))),
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(QuestError::internal(format!("unscripted {}", operation)))),
        }
    }
}

pub(crate) struct MockRemote {
    pub quests: Script<Vec<QuestEntry>>,
    pub submit: Script<SubmitProofResponse>,
    pub submitted: Mutex<Vec<ProofUpload>>,
    pub belief: Script<Option<BeliefState>>,
    pub feed: Script<ProofFeedPage>,
    pub journal: Script<Vec<ProofDetails>>,
    pub user_journal: Script<Vec<ProofDetails>>,
    pub journal_users: Mutex<Vec<String>>,
    pub proof_details: Script<ProofDetails>,
    pub session: Script<Option<UserSession>>,
    pub login: Script<UserSession>,
    pub register: Script<UserSession>,
    pub logout: Script<()>,
    pub lobbies: Script<Vec<LobbyFeedItem>>,
    pub create_lobby: Script<Lobby>,
    pub join_lobby: Script<LobbyMember>,
    pub lobby_details: Script<LobbyDetails>,
    pub members_count: Script<u32>,
}

impl MockRemote {
    pub(crate) fn new() -> Self {
        Self {
            quests: Script::new(),
            submit: Script::new(),
            submitted: Mutex::new(Vec::new()),
            belief: Script::new(),
            feed: Script::new(),
            journal: Script::new(),
            user_journal: Script::new(),
            journal_users: Mutex::new(Vec::new()),
            proof_details: Script::new(),
            session: Script::new(),
            login: Script::new(),
            register: Script::new(),
            logout: Script::new(),
            lobbies: Script::new(),
            create_lobby: Script::new(),
            join_lobby: Script::new(),
            lobby_details: Script::new(),
            members_count: Script::new(),
        }
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn list_daily_quests(&self) -> Result<Vec<QuestEntry>> {
        self.quests.next("list_daily_quests").await
    }

    async fn submit_proof(&self, upload: ProofUpload) -> Result<SubmitProofResponse> {
        self.submitted.lock().unwrap().push(upload);
        self.submit.next("submit_proof").await
    }

    async fn toggle_belief(&self, _proof_id: &str) -> Result<Option<BeliefState>> {
        self.belief.next("toggle_belief").await
    }

    async fn get_proof_feed(&self, _page: Pagination) -> Result<ProofFeedPage> {
        self.feed.next("get_proof_feed").await
    }

    async fn get_my_journal(&self) -> Result<Vec<ProofDetails>> {
        self.journal.next("get_my_journal").await
    }

    async fn get_user_journal(&self, user_id: &str) -> Result<Vec<ProofDetails>> {
        self.journal_users.lock().unwrap().push(user_id.to_string());
        self.user_journal.next("get_user_journal").await
    }

    async fn get_proof_details(&self, _proof_id: &str) -> Result<ProofDetails> {
        self.proof_details.next("get_proof_details").await
    }

    async fn get_current_session(&self) -> Result<Option<UserSession>> {
        self.session.next("get_current_session").await
    }

    async fn login(&self, _request: LoginRequest) -> Result<UserSession> {
        self.login.next("login").await
    }

    async fn register(&self, _request: RegisterRequest) -> Result<UserSession> {
        self.register.next("register").await
    }

    async fn logout(&self) -> Result<()> {
        self.logout.next("logout").await
    }

    async fn list_lobbies(&self) -> Result<Vec<LobbyFeedItem>> {
        self.lobbies.next("list_lobbies").await
    }

    async fn create_lobby(&self, _lobby: NewLobby) -> Result<Lobby> {
        self.create_lobby.next("create_lobby").await
    }

    async fn join_lobby(&self, _lobby_id: &str) -> Result<LobbyMember> {
        self.join_lobby.next("join_lobby").await
    }

    async fn get_lobby_details(&self, _lobby_id: &str) -> Result<LobbyDetails> {
        self.lobby_details.next("get_lobby_details").await
    }

    async fn get_lobby_members_count(&self, _lobby_id: &str) -> Result<u32> {
        self.members_count.next("get_lobby_members_count").await
    }
}

/// Loads `Bytes` sources as-is and fails every `File` source.
pub(crate) struct InMemoryLoader;

#[async_trait]
impl AttachmentLoader for InMemoryLoader {
    async fn load(&self, source: &AttachmentSource) -> Result<Vec<u8>> {
        match source {
            AttachmentSource::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentSource::File(path) => Err(QuestError::io(format!(
                "cannot read {}",
                path.display()
            ))),
        }
    }
}

pub(crate) fn quest_entry(id: &str, status: QuestStatus) -> QuestEntry {
    QuestEntry {
        user_ulid: "user-1".to_string(),
        quest: Quest {
            ulid: id.to_string(),
            title: format!("Quest {}", id),
            description: None,
            complexity: Complexity::Easy,
            xp_reward: 10,
            validation_type: "PHOTO".to_string(),
            target_value: 1,
        },
        status,
        current_value: 0,
        is_completed: status == QuestStatus::Completed,
        completed_at: None,
    }
}

pub(crate) fn proof(id: &str, is_believed: bool, beliefs_count: u32) -> ProofDetails {
    ProofDetails {
        ulid: id.to_string(),
        user_id: "user-2".to_string(),
        username: "runner".to_string(),
        avatar_url: None,
        quest_id: "q1".to_string(),
        quest_title: format!("Quest for {}", id),
        quest_description: None,
        xp_reward: 10,
        proof_text: Some("done".to_string()),
        status: "PENDING".to_string(),
        photo_urls: Vec::new(),
        voice_urls: Vec::new(),
        beliefs_count,
        is_believed,
        created_at: Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
    }
}

pub(crate) fn feed_page(items: Vec<ProofDetails>) -> ProofFeedPage {
    ProofFeedPage {
        next_offset: items.len() as u32,
        items,
        has_more: false,
    }
}

pub(crate) fn session() -> UserSession {
    UserSession {
        user_ulid: "user-1".to_string(),
        email: "hero@example.com".to_string(),
        username: "hero".to_string(),
        level: 3,
        avatar_url: None,
    }
}

pub(crate) fn lobby(id: &str, is_member: bool) -> LobbyFeedItem {
    LobbyFeedItem {
        lobby: Lobby {
            ulid: id.to_string(),
            name: format!("Lobby {}", id),
            topic: "fitness".to_string(),
            description: None,
            owner_id: "user-9".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        },
        is_member,
    }
}

pub(crate) fn membership(lobby_id: &str) -> LobbyMember {
    LobbyMember {
        lobby_id: lobby_id.to_string(),
        user_id: "user-1".to_string(),
        role: Role::Member,
        joined_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
    }
}

pub(crate) fn submit_response(proof_id: &str) -> SubmitProofResponse {
    SubmitProofResponse {
        proof_ulid: proof_id.to_string(),
        status: "PENDING".to_string(),
        photo_upload_urls: Vec::new(),
        voice_upload_urls: Vec::new(),
    }
}
