//! Lobby domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{QuestError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    pub ulid: String,
    pub name: String,
    pub topic: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// A lobby as listed for the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyFeedItem {
    pub lobby: Lobby,
    pub is_member: bool,
}

/// A single lobby with its member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyDetails {
    pub lobby: Lobby,
    pub members_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyPatch {
    pub is_member: Option<bool>,
}

impl Entity for LobbyFeedItem {
    type Patch = LobbyPatch;

    const ENTITY_TYPE: &'static str = "lobby";

    fn id(&self) -> &str {
        &self.lobby.ulid
    }

    fn apply_patch(&mut self, patch: &LobbyPatch) -> bool {
        match patch.is_member {
            Some(member) if member != self.is_member => {
                self.is_member = member;
                true
            }
            _ => false,
        }
    }

    fn patch_is_empty(patch: &LobbyPatch) -> bool {
        patch.is_member.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Stranger,
    Member,
    Helper,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyMember {
    pub lobby_id: String,
    pub user_id: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// Client-side input for creating a lobby. The owner is the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLobby {
    pub name: String,
    pub topic: String,
    pub description: Option<String>,
}

impl NewLobby {
    pub fn validate(&self) -> Result<()> {
        check_len("name", &self.name, 3, 50)?;
        check_len("topic", &self.topic, 2, 30)?;
        if let Some(description) = &self.description {
            check_len("description", description, 0, 500)?;
        }
        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(QuestError::validation(format!(
            "Lobby {} must be {}-{} characters (got {})",
            field, min, max, len
        )));
    }
    Ok(())
}
