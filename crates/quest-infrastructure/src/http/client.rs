//! `RemoteClient` over the quest backend's HTTP API.

use super::endpoints::Endpoint;
use crate::storage::{SessionFile, StoredSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quest_core::config::ClientConfig;
use quest_core::lobby::{Lobby, LobbyDetails, LobbyFeedItem, LobbyMember, NewLobby};
use quest_core::proof::{
    BeliefState, Pagination, ProofDetails, ProofFeedPage, ProofUpload, SubmitProofResponse,
};
use quest_core::quest::QuestEntry;
use quest_core::session::{LoginRequest, RegisterRequest, UserSession};
use quest_core::{ErrorBody, ErrorCode, QuestError, RemoteClient, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// Access tokens this close to expiry are treated as expired.
const ACCESS_TOKEN_SKEW_SECS: i64 = 10;

#[derive(Deserialize)]
struct AuthResponse {
    ulid: String,
    refresh_token: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    level: u32,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    new_refresh_token: String,
    expires_in_seconds: i64,
}

#[derive(Deserialize)]
struct DailyQuestsResponse {
    quests: Vec<QuestEntry>,
}

#[derive(Deserialize)]
struct LobbyFeedResponse {
    items: Vec<LobbyFeedItem>,
}

#[derive(Serialize)]
struct CreateLobbyRequest<'a> {
    name: &'a str,
    topic: &'a str,
    description: Option<&'a str>,
    owner_id: &'a str,
}

struct Credentials {
    stored: StoredSession,
    access_token: Option<String>,
    access_expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    fn restored(stored: StoredSession) -> Self {
        Self {
            stored,
            access_token: None,
            access_expires_at: None,
        }
    }

    fn fresh_token(&self) -> Option<&str> {
        let deadline = Utc::now() + chrono::Duration::seconds(ACCESS_TOKEN_SKEW_SECS);
        match (&self.access_token, self.access_expires_at) {
            (Some(token), Some(expires_at)) if expires_at > deadline => Some(token.as_str()),
            _ => None,
        }
    }
}

/// HTTP implementation of [`RemoteClient`].
///
/// Owns the credentials. Requests carry the access token as a bearer token;
/// a `401` on a non-credential route triggers one refresh and one retry.
pub struct HttpRemoteClient {
    client: reqwest::Client,
    api_url: String,
    timeout_ms: u64,
    sessions: SessionFile,
    credentials: RwLock<Option<Credentials>>,
    refresh_lock: Mutex<()>,
}

impl HttpRemoteClient {
    /// Builds the client and restores any stored session.
    ///
    /// A restored session has no access token; the first session check refreshes it.
    pub async fn connect(config: &ClientConfig, sessions: SessionFile) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| QuestError::transport(format!("Failed to build HTTP client: {}", e)))?;

        let stored = match sessions.load().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    "[HttpRemoteClient] Ignoring unreadable session file {}: {}",
                    sessions.path().display(),
                    e
                );
                None
            }
        };
        match &stored {
            Some(s) => tracing::info!("[HttpRemoteClient] Restored session for {}", s.email),
            None => tracing::info!("[HttpRemoteClient] No stored session"),
        }

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            timeout_ms: config.request_timeout().as_millis() as u64,
            sessions,
            credentials: RwLock::new(stored.map(Credentials::restored)),
            refresh_lock: Mutex::new(()),
        })
    }

    async fn current_user(&self) -> Result<String> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.stored.user_ulid.clone())
            .ok_or(QuestError::Unauthenticated)
    }

    /// Sends one request. Returns the response and the access token it carried.
    async fn send<B>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        query: Option<&Pagination>,
    ) -> Result<(reqwest::Response, Option<String>)>
    where
        B: Serialize + ?Sized,
    {
        let token = self
            .credentials
            .read()
            .await
            .as_ref()
            .and_then(|c| c.access_token.clone());
        let url = endpoint.url(&self.api_url);
        tracing::debug!("[HttpRemoteClient] {} {}", endpoint.method(), url);

        let mut request = self.client.request(endpoint.method(), &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(page) = query {
            request = request.query(page);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        Ok((response, token))
    }

    async fn request<B, T>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
        query: Option<&Pagination>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (response, used_token) = self.send(&endpoint, body, query).await?;

        if response.status() == StatusCode::UNAUTHORIZED && !endpoint.is_auth_endpoint() {
            tracing::warn!(
                "[HttpRemoteClient] Unauthorized on {}, refreshing access token",
                endpoint.path()
            );
            self.refresh_access_token(used_token.as_deref()).await?;
            let (retry, _) = self.send(&endpoint, body, query).await?;
            return self.parse_response(retry).await;
        }

        self.parse_response(response).await
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Serialized: a caller that waited on the lock and finds a token newer
    /// than `stale` returns without calling the backend.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let (email, refresh_token) = {
            let credentials = self.credentials.read().await;
            let credentials = credentials.as_ref().ok_or(QuestError::Unauthenticated)?;
            if let Some(token) = credentials.fresh_token() {
                if Some(token) != stale {
                    tracing::debug!("[HttpRemoteClient] Access token already refreshed");
                    return Ok(());
                }
            }
            (
                credentials.stored.email.clone(),
                credentials.stored.refresh_token.clone(),
            )
        };

        tracing::info!("[HttpRemoteClient] Refreshing access token for {}", email);
        let payload = RefreshRequest {
            refresh_token: &refresh_token,
            email: &email,
        };
        let (response, _) = self
            .send(&Endpoint::CreateRefreshToken, Some(&payload), None)
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("[HttpRemoteClient] Refresh token rejected for {}", email);
            return Err(QuestError::remote(
                ErrorCode::AuthInvalid,
                "Refresh token rejected",
            ));
        }
        let refreshed: RefreshResponse = self.parse_response(response).await?;

        let stored = {
            let mut credentials = self.credentials.write().await;
            let credentials = credentials.as_mut().ok_or(QuestError::Unauthenticated)?;
            credentials.access_token = Some(refreshed.access_token);
            credentials.access_expires_at =
                Some(Utc::now() + chrono::Duration::seconds(refreshed.expires_in_seconds));
            credentials.stored.refresh_token = refreshed.new_refresh_token;
            credentials.stored.clone()
        };
        self.sessions.save(&stored).await?;
        Ok(())
    }

    /// Stores the credentials returned by login/register and fetches an access token.
    async fn establish(&self, auth: AuthResponse, email: String, username: String) -> Result<UserSession> {
        let stored = StoredSession {
            user_ulid: auth.ulid,
            email,
            username: auth.username.unwrap_or(username),
            level: auth.level,
            avatar_url: auth.avatar_url,
            refresh_token: auth.refresh_token,
        };
        self.sessions.save(&stored).await?;
        *self.credentials.write().await = Some(Credentials::restored(stored.clone()));

        if let Err(e) = self.refresh_access_token(None).await {
            tracing::warn!(
                "[HttpRemoteClient] No access token after sign-in, will retry on demand: {}",
                e
            );
        }
        tracing::info!("[HttpRemoteClient] Signed in as {}", stored.email);
        Ok(stored.user_session())
    }

    async fn clear_session(&self) -> Result<()> {
        *self.credentials.write().await = None;
        self.sessions.delete().await
    }

    async fn upload(&self, url: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[HttpRemoteClient] Upload failed ({}): {}", status, body);
            return Err(QuestError::transport(format!(
                "Attachment upload failed ({})",
                status
            )));
        }
        Ok(())
    }

    async fn parse_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        if status.is_success() {
            let body = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(body).map_err(|e| {
                tracing::error!("[HttpRemoteClient] Bad response body from {}: {}", url, e);
                QuestError::from(e)
            });
        }

        let err = error_from_status(status, &text);
        tracing::warn!("[HttpRemoteClient] {} answered {}: {}", url, status, err);
        Err(err)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> QuestError {
        if err.is_timeout() {
            QuestError::timeout(url, self.timeout_ms)
        } else {
            tracing::error!("[HttpRemoteClient] Request to {} failed: {}", url, err);
            QuestError::transport(err.to_string())
        }
    }
}

/// Maps a non-success response to an error, preferring the wire error body.
fn error_from_status(status: StatusCode, body: &str) -> QuestError {
    if let Ok(error) = serde_json::from_str::<ErrorBody>(body) {
        return error.into();
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            QuestError::remote(ErrorCode::AuthInvalid, "")
        }
        StatusCode::NOT_FOUND => QuestError::remote(ErrorCode::NotFound, ""),
        s if s.is_server_error() => QuestError::remote(ErrorCode::ServerError, format!("HTTP {}", s)),
        s => QuestError::transport(format!("HTTP {}", s)),
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list_daily_quests(&self) -> Result<Vec<QuestEntry>> {
        let user = self.current_user().await?;
        let response: DailyQuestsResponse = self
            .request::<(), _>(Endpoint::DailyQuests { user }, None, None)
            .await?;
        Ok(response.quests)
    }

    async fn submit_proof(&self, upload: ProofUpload) -> Result<SubmitProofResponse> {
        let user = self.current_user().await?;
        let response: SubmitProofResponse = self
            .request(
                Endpoint::InitSubmission {
                    user,
                    quest: upload.quest_id.clone(),
                },
                Some(&upload.request),
                None,
            )
            .await?;

        if response.photo_upload_urls.len() < upload.images.len()
            || response.voice_upload_urls.len() < upload.audios.len()
        {
            return Err(QuestError::internal(format!(
                "Server issued {}/{} upload URLs for {}/{} attachments",
                response.photo_upload_urls.len(),
                response.voice_upload_urls.len(),
                upload.images.len(),
                upload.audios.len()
            )));
        }

        for (data, url) in upload.images.into_iter().zip(&response.photo_upload_urls) {
            self.upload(url, "image/jpeg", data).await?;
        }
        for (data, url) in upload.audios.into_iter().zip(&response.voice_upload_urls) {
            self.upload(url, "audio/ogg", data).await?;
        }

        let _: IgnoredAny = self
            .request::<(), _>(
                Endpoint::ConfirmSubmission {
                    proof: response.proof_ulid.clone(),
                },
                None,
                None,
            )
            .await?;
        tracing::info!(
            "[HttpRemoteClient] Proof {} confirmed",
            response.proof_ulid
        );
        Ok(response)
    }

    async fn toggle_belief(&self, proof_id: &str) -> Result<Option<BeliefState>> {
        let user = self.current_user().await?;
        self.request::<(), _>(
            Endpoint::Belief {
                proof: proof_id.to_string(),
                user,
            },
            None,
            None,
        )
        .await
    }

    async fn get_proof_feed(&self, page: Pagination) -> Result<ProofFeedPage> {
        let user = self.current_user().await?;
        self.request::<(), _>(Endpoint::Feed { user }, None, Some(&page))
            .await
    }

    async fn get_my_journal(&self) -> Result<Vec<ProofDetails>> {
        let user = self.current_user().await?;
        self.request::<(), _>(Endpoint::Journal { user }, None, None)
            .await
    }

    async fn get_user_journal(&self, user_id: &str) -> Result<Vec<ProofDetails>> {
        self.request::<(), _>(
            Endpoint::Journal {
                user: user_id.to_string(),
            },
            None,
            None,
        )
        .await
    }

    async fn get_proof_details(&self, proof_id: &str) -> Result<ProofDetails> {
        self.request::<(), _>(
            Endpoint::ProofDetails {
                proof: proof_id.to_string(),
            },
            None,
            None,
        )
        .await
    }

    async fn get_current_session(&self) -> Result<Option<UserSession>> {
        let needs_refresh = match self.credentials.read().await.as_ref() {
            None => {
                tracing::debug!("[HttpRemoteClient] No current session");
                return Ok(None);
            }
            Some(credentials) => credentials.fresh_token().is_none(),
        };

        if needs_refresh {
            match self.refresh_access_token(None).await {
                Ok(()) => {}
                Err(e) if e.code() == Some(ErrorCode::AuthInvalid) => {
                    tracing::warn!("[HttpRemoteClient] Refresh token invalid, clearing session");
                    self.clear_session().await?;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self
            .credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.stored.user_session()))
    }

    async fn login(&self, request: LoginRequest) -> Result<UserSession> {
        tracing::info!("[HttpRemoteClient] Login attempt for {}", request.email);
        let auth: AuthResponse = self.request(Endpoint::Login, Some(&request), None).await?;
        let username = auth.username.clone().unwrap_or_default();
        self.establish(auth, request.email, username).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<UserSession> {
        tracing::info!("[HttpRemoteClient] Registering {}", request.email);
        let auth: AuthResponse = self.request(Endpoint::Register, Some(&request), None).await?;
        self.establish(auth, request.email, request.username).await
    }

    async fn logout(&self) -> Result<()> {
        let token = self
            .credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.stored.refresh_token.clone());

        match token {
            Some(token) => {
                let deleted = self
                    .request::<(), IgnoredAny>(Endpoint::DeleteRefreshToken { token }, None, None)
                    .await;
                if let Err(e) = deleted {
                    tracing::warn!(
                        "[HttpRemoteClient] Could not revoke refresh token remotely: {}",
                        e
                    );
                }
            }
            None => tracing::warn!("[HttpRemoteClient] Logout called without an active session"),
        }

        self.clear_session().await?;
        tracing::info!("[HttpRemoteClient] Logged out");
        Ok(())
    }

    async fn list_lobbies(&self) -> Result<Vec<LobbyFeedItem>> {
        let user = self.current_user().await?;
        let response: LobbyFeedResponse = self
            .request::<(), _>(Endpoint::Lobbies { user }, None, None)
            .await?;
        Ok(response.items)
    }

    async fn create_lobby(&self, lobby: NewLobby) -> Result<Lobby> {
        let owner = self.current_user().await?;
        let payload = CreateLobbyRequest {
            name: lobby.name.trim(),
            topic: lobby.topic.trim(),
            description: lobby.description.as_deref(),
            owner_id: &owner,
        };
        self.request(Endpoint::CreateLobby, Some(&payload), None)
            .await
    }

    async fn join_lobby(&self, lobby_id: &str) -> Result<LobbyMember> {
        let user = self.current_user().await?;
        self.request::<(), _>(
            Endpoint::JoinLobby {
                lobby: lobby_id.to_string(),
                user,
            },
            None,
            None,
        )
        .await
    }

    async fn get_lobby_details(&self, lobby_id: &str) -> Result<LobbyDetails> {
        self.request::<(), _>(
            Endpoint::LobbyDetails {
                lobby: lobby_id.to_string(),
            },
            None,
            None,
        )
        .await
    }

    async fn get_lobby_members_count(&self, lobby_id: &str) -> Result<u32> {
        self.request::<(), _>(
            Endpoint::LobbyMembersCount {
                lobby: lobby_id.to_string(),
            },
            None,
            None,
        )
        .await
    }
}
