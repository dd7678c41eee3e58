//! Proof domain model.
//!
//! Proofs are what users publish when they finish a quest. Other users endorse
//! ("believe") them, which is the social signal shown in the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{QuestError, Result};

/// Maximum number of photos in a single submission.
pub const MAX_PHOTOS: u32 = 5;
/// Maximum number of voice notes in a single submission.
pub const MAX_VOICES: u32 = 3;

/// Endorsement of a proof by the current user, plus the aggregate count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefState {
    pub is_believed: bool,
    pub beliefs_count: u32,
}

impl BeliefState {
    pub fn new(is_believed: bool, beliefs_count: u32) -> Self {
        Self {
            is_believed,
            beliefs_count,
        }
    }

    /// The state after the current user flips their endorsement.
    pub fn toggled(&self) -> Self {
        if self.is_believed {
            Self::new(false, self.beliefs_count.saturating_sub(1))
        } else {
            Self::new(true, self.beliefs_count.saturating_add(1))
        }
    }
}

/// A published proof as shown in the feed or the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofDetails {
    pub ulid: String,
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub quest_id: String,
    pub quest_title: String,
    pub quest_description: Option<String>,
    pub xp_reward: u32,
    pub proof_text: Option<String>,
    pub status: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub voice_urls: Vec<String>,
    pub beliefs_count: u32,
    pub is_believed: bool,
    pub created_at: DateTime<Utc>,
}

impl ProofDetails {
    pub fn belief(&self) -> BeliefState {
        BeliefState::new(self.is_believed, self.beliefs_count)
    }
}

/// Partial update for a [`ProofDetails`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProofPatch {
    pub belief: Option<BeliefState>,
    pub status: Option<String>,
}

impl ProofPatch {
    pub fn belief(state: BeliefState) -> Self {
        Self {
            belief: Some(state),
            ..Default::default()
        }
    }
}

impl Entity for ProofDetails {
    type Patch = ProofPatch;

    const ENTITY_TYPE: &'static str = "proof";

    fn id(&self) -> &str {
        &self.ulid
    }

    fn apply_patch(&mut self, patch: &ProofPatch) -> bool {
        let mut changed = false;
        if let Some(belief) = patch.belief {
            if self.belief() != belief {
                self.is_believed = belief.is_believed;
                self.beliefs_count = belief.beliefs_count;
                changed = true;
            }
        }
        if let Some(status) = &patch.status {
            if &self.status != status {
                self.status = status.clone();
                changed = true;
            }
        }
        changed
    }

    fn patch_is_empty(patch: &ProofPatch) -> bool {
        *patch == ProofPatch::default()
    }
}

/// One page of the community feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofFeedPage {
    pub items: Vec<ProofDetails>,
    pub has_more: bool,
    pub next_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub fn first_page(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Metadata sent ahead of the binary payloads of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitProofRequest {
    /// `None` when the user wrote nothing.
    pub proof_text: Option<String>,
    pub photo_count: u32,
    pub voice_count: u32,
}

impl SubmitProofRequest {
    /// Builds the request, coercing blank text to `None`.
    pub fn new(text: &str, photo_count: u32, voice_count: u32) -> Self {
        let trimmed = text.trim();
        Self {
            proof_text: if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            },
            photo_count,
            voice_count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.photo_count > MAX_PHOTOS {
            return Err(QuestError::validation(format!(
                "At most {} photos per proof (got {})",
                MAX_PHOTOS, self.photo_count
            )));
        }
        if self.voice_count > MAX_VOICES {
            return Err(QuestError::validation(format!(
                "At most {} voice notes per proof (got {})",
                MAX_VOICES, self.voice_count
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitProofResponse {
    pub proof_ulid: String,
    pub status: String,
    #[serde(default)]
    pub photo_upload_urls: Vec<String>,
    #[serde(default)]
    pub voice_upload_urls: Vec<String>,
}

/// Everything the remote needs for one logical submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofUpload {
    pub quest_id: String,
    pub request: SubmitProofRequest,
    pub images: Vec<Vec<u8>>,
    pub audios: Vec<Vec<u8>>,
}
