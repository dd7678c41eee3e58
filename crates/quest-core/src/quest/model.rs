//! Quest domain model.
//!
//! A quest is the template (title, reward, target), a [`QuestEntry`] is the
//! current user's progress on it for the day. Entries are what the client tracks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Progress state of a quest entry.
///
/// Transitions are monotonic: `NotStarted`/`InProgress` may move to `Pending`,
/// which resolves to `Completed` or `Failed`. Both outcomes are terminal for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    NotStarted,
    InProgress,
    /// Proof submitted, waiting for the community verdict.
    #[serde(rename = "IN_PENDING", alias = "PENDING")]
    Pending,
    Completed,
    Failed,
}

impl QuestStatus {
    fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::InProgress => 1,
            Self::Pending => 2,
            Self::Completed | Self::Failed => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` respects the monotonic order.
    ///
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: QuestStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

/// Quest template as published by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub ulid: String,
    pub title: String,
    pub description: Option<String>,
    pub complexity: Complexity,
    pub xp_reward: u32,
    pub validation_type: String,
    pub target_value: u32,
}

/// The current user's state on one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestEntry {
    pub user_ulid: String,
    pub quest: Quest,
    pub status: QuestStatus,
    pub current_value: u32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestEntry {
    /// `(current_value, target_value)`
    pub fn progress(&self) -> (u32, u32) {
        (self.current_value, self.quest.target_value)
    }

    pub fn reward(&self) -> u32 {
        self.quest.xp_reward
    }
}

/// Partial update for a [`QuestEntry`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestPatch {
    pub status: Option<QuestStatus>,
    pub current_value: Option<u32>,
    pub is_completed: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for QuestEntry {
    type Patch = QuestPatch;

    const ENTITY_TYPE: &'static str = "quest";

    fn id(&self) -> &str {
        &self.quest.ulid
    }

    fn apply_patch(&mut self, patch: &QuestPatch) -> bool {
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                tracing::warn!(
                    "[QuestEntry] Ignoring status change {:?} -> {:?} for quest {}",
                    self.status,
                    next,
                    self.quest.ulid
                );
                return false;
            }
        }

        let before = self.clone();
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(value) = patch.current_value {
            self.current_value = value;
        }
        if let Some(done) = patch.is_completed {
            self.is_completed = done;
        }
        if let Some(at) = patch.completed_at {
            self.completed_at = Some(at);
        }
        *self != before
    }

    fn patch_is_empty(patch: &QuestPatch) -> bool {
        *patch == QuestPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, status: QuestStatus) -> QuestEntry {
        QuestEntry {
            user_ulid: "user-1".to_string(),
            quest: Quest {
                ulid: id.to_string(),
                title: format!("Quest {}", id),
                description: None,
                complexity: Complexity::Easy,
                xp_reward: 50,
                validation_type: "photo".to_string(),
                target_value: 3,
            },
            status,
            current_value: 0,
            is_completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_status_wire_names() {
        let pending: QuestStatus = serde_json::from_str("\"IN_PENDING\"").unwrap();
        assert_eq!(pending, QuestStatus::Pending);

        let alias: QuestStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(alias, QuestStatus::Pending);

        assert_eq!(
            serde_json::to_string(&QuestStatus::NotStarted).unwrap(),
            "\"NOT_STARTED\""
        );
    }

    #[test]
    fn test_transitions_are_monotonic() {
        use QuestStatus::*;

        assert!(NotStarted.can_transition_to(InProgress));
        assert!(NotStarted.can_transition_to(Pending));
        assert!(InProgress.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(NotStarted));
    }

    #[test]
    fn test_patch_rejects_backwards_status() {
        let mut e = entry("q1", QuestStatus::Completed);
        let changed = e.apply_patch(&QuestPatch {
            status: Some(QuestStatus::InProgress),
            current_value: Some(2),
            ..Default::default()
        });

        assert!(!changed);
        assert_eq!(e.status, QuestStatus::Completed);
        assert_eq!(e.current_value, 0);
    }

    #[test]
    fn test_patch_merges_fields() {
        let mut e = entry("q1", QuestStatus::InProgress);
        let changed = e.apply_patch(&QuestPatch {
            current_value: Some(2),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(e.progress(), (2, 3));
        assert_eq!(e.status, QuestStatus::InProgress);
    }
}
