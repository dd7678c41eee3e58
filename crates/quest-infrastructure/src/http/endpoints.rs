//! Backend routes.

use reqwest::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    CreateRefreshToken,
    DeleteRefreshToken { token: String },
    DailyQuests { user: String },
    InitSubmission { user: String, quest: String },
    ConfirmSubmission { proof: String },
    ProofDetails { proof: String },
    Feed { user: String },
    Journal { user: String },
    Belief { proof: String, user: String },
    Lobbies { user: String },
    CreateLobby,
    JoinLobby { lobby: String, user: String },
    LobbyDetails { lobby: String },
    LobbyMembersCount { lobby: String },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::CreateRefreshToken => "/refresh_token".to_string(),
            Self::DeleteRefreshToken { token } => format!("/refresh_token/{token}"),
            Self::DailyQuests { user } => format!("/users/{user}/quests/daily"),
            Self::InitSubmission { user, quest } => format!("/users/{user}/quests/{quest}/proofs"),
            Self::ConfirmSubmission { proof } => format!("/proofs/{proof}/confirm"),
            Self::ProofDetails { proof } => format!("/proofs/{proof}"),
            Self::Feed { user } => format!("/users/{user}/feed"),
            Self::Journal { user } => format!("/users/{user}/journal"),
            Self::Belief { proof, user } => format!("/proofs/{proof}/likes/{user}"),
            Self::Lobbies { user } => format!("/users/{user}/lobbies"),
            Self::CreateLobby => "/lobbies".to_string(),
            Self::JoinLobby { lobby, user } => format!("/lobbies/{lobby}/join/{user}"),
            Self::LobbyDetails { lobby } => format!("/lobbies/{lobby}"),
            Self::LobbyMembersCount { lobby } => format!("/lobbies/{lobby}/members/count"),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::DailyQuests { .. }
            | Self::Feed { .. }
            | Self::Journal { .. }
            | Self::ProofDetails { .. }
            | Self::Lobbies { .. }
            | Self::LobbyDetails { .. }
            | Self::LobbyMembersCount { .. } => Method::GET,
            Self::DeleteRefreshToken { .. } => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Credential endpoints. A `401` from them is an answer, not a cue to refresh.
    pub fn is_auth_endpoint(&self) -> bool {
        matches!(
            self,
            Self::Login | Self::Register | Self::CreateRefreshToken | Self::DeleteRefreshToken { .. }
        )
    }

    pub fn url(&self, api_url: &str) -> String {
        format!("{}{}", api_url, self.path())
    }
}
