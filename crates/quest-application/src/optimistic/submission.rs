//! Proof submission: the draft a user composes and the state machine that sends it.

use crate::call::remote_call;
use crate::store::QuestStore;
use quest_core::proof::{
    AttachmentKind, AttachmentLoader, AttachmentSource, ProofUpload, SubmitProofRequest,
    SubmitProofResponse,
};
use quest_core::{QuestError, RemoteClient, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Tracks live attachment previews so leaks are observable.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(id);
        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A transient preview resource for one attachment. Released on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

#[derive(Debug)]
pub struct DraftAttachment {
    pub kind: AttachmentKind,
    pub source: AttachmentSource,
    pub preview: PreviewHandle,
}

/// The proof being composed for one quest.
///
/// Survives a failed submission untouched so the user can retry.
#[derive(Debug)]
pub struct ProofDraft {
    target: Option<String>,
    text: String,
    attachments: Vec<DraftAttachment>,
    previews: PreviewRegistry,
}

impl ProofDraft {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            target: None,
            text: String::new(),
            attachments: Vec::new(),
            previews,
        }
    }

    pub fn select_target(&mut self, quest_id: impl Into<String>) {
        self.target = Some(quest_id.into());
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn add_image(&mut self, source: AttachmentSource) {
        self.push(AttachmentKind::Image, source);
    }

    pub fn add_voice(&mut self, source: AttachmentSource) {
        self.push(AttachmentKind::Voice, source);
    }

    fn push(&mut self, kind: AttachmentKind, source: AttachmentSource) {
        let preview = self.previews.acquire();
        self.attachments.push(DraftAttachment {
            kind,
            source,
            preview,
        });
    }

    /// Removes the attachment at `index`, releasing its preview.
    pub fn remove_attachment(&mut self, index: usize) -> bool {
        if index < self.attachments.len() {
            self.attachments.remove(index);
            true
        } else {
            false
        }
    }

    pub fn attachments(&self) -> &[DraftAttachment] {
        &self.attachments
    }

    /// `(photos, voices)`
    pub fn counts(&self) -> (u32, u32) {
        self.attachments
            .iter()
            .fold((0, 0), |(photos, voices), a| match a.kind {
                AttachmentKind::Image => (photos + 1, voices),
                AttachmentKind::Voice => (photos, voices + 1),
            })
    }

    /// Drops text, attachments (and their previews) and the target.
    pub fn clear(&mut self) {
        self.target = None;
        self.text.clear();
        self.attachments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.text.is_empty() && self.attachments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Converting,
    Submitting,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Submitted(SubmitProofResponse),
    /// No quest was selected; nothing happened.
    NoTarget,
    /// Another submission is running; this one was not started.
    AlreadySubmitting,
}

/// Resets the phase to `Idle` on every exit path, including cancellation.
struct PhaseReset<'a>(&'a watch::Sender<SubmissionPhase>);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.send_replace(SubmissionPhase::Idle);
    }
}

/// Sends a [`ProofDraft`] as one logical submission.
///
/// Idle -> Validating -> Converting -> Submitting -> Refreshing -> Idle.
/// Any failure returns to Idle with the draft intact and the error recorded.
pub struct ProofSubmitter {
    remote: Arc<dyn RemoteClient>,
    loader: Arc<dyn AttachmentLoader>,
    quests: Arc<QuestStore>,
    timeout: Duration,
    phase: watch::Sender<SubmissionPhase>,
    last_error: Mutex<Option<QuestError>>,
}

impl ProofSubmitter {
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        loader: Arc<dyn AttachmentLoader>,
        quests: Arc<QuestStore>,
        timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(SubmissionPhase::Idle);
        Self {
            remote,
            loader,
            quests,
            timeout,
            phase,
            last_error: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        *self.phase.borrow()
    }

    /// Receives every phase change.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionPhase> {
        self.phase.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() != SubmissionPhase::Idle
    }

    /// The error of the last failed submission, cleared by the next success.
    pub fn last_error(&self) -> Option<QuestError> {
        self.error_slot().clone()
    }

    /// Submits `draft`.
    ///
    /// On success the quest store is refreshed exactly once and the draft is
    /// cleared. On failure the draft is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the validation, attachment, or remote error that stopped the
    /// submission. The same error is kept in [`last_error`](Self::last_error).
    pub async fn submit(&self, draft: &mut ProofDraft) -> Result<SubmissionOutcome> {
        let started = self.phase.send_if_modified(|phase| {
            if *phase == SubmissionPhase::Idle {
                *phase = SubmissionPhase::Validating;
                true
            } else {
                false
            }
        });
        if !started {
            tracing::debug!("[ProofSubmitter] Submission already running, ignoring");
            return Ok(SubmissionOutcome::AlreadySubmitting);
        }
        let _reset = PhaseReset(&self.phase);

        let Some(quest_id) = draft.target().map(str::to_string) else {
            tracing::debug!("[ProofSubmitter] No quest selected, nothing to submit");
            return Ok(SubmissionOutcome::NoTarget);
        };

        let (photos, voices) = draft.counts();
        let request = SubmitProofRequest::new(draft.text(), photos, voices);
        if let Err(err) = request.validate() {
            return Err(self.fail(&quest_id, err));
        }

        self.phase.send_replace(SubmissionPhase::Converting);
        let mut images = Vec::with_capacity(photos as usize);
        let mut audios = Vec::with_capacity(voices as usize);
        for (index, attachment) in draft.attachments().iter().enumerate() {
            let bytes = match self.loader.load(&attachment.source).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let err = QuestError::Attachment {
                        index,
                        message: err.to_string(),
                    };
                    return Err(self.fail(&quest_id, err));
                }
            };
            match attachment.kind {
                AttachmentKind::Image => images.push(bytes),
                AttachmentKind::Voice => audios.push(bytes),
            }
        }

        self.phase.send_replace(SubmissionPhase::Submitting);
        let upload = ProofUpload {
            quest_id: quest_id.clone(),
            request,
            images,
            audios,
        };
        let response = match remote_call(
            "submit_proof",
            self.timeout,
            self.remote.submit_proof(upload),
        )
        .await
        {
            Ok(response) => response,
            Err(err) => return Err(self.fail(&quest_id, err)),
        };

        tracing::info!(
            "[ProofSubmitter] Proof {} submitted for quest {}",
            response.proof_ulid,
            quest_id
        );
        self.phase.send_replace(SubmissionPhase::Refreshing);
        if let Err(err) = self.quests.refresh().await {
            // The submission itself succeeded; the stale list is flagged by the store.
            tracing::warn!("[ProofSubmitter] Refresh after submission failed: {}", err);
        }

        draft.clear();
        *self.error_slot() = None;
        Ok(SubmissionOutcome::Submitted(response))
    }

    /// Closes the draft unless a submission is running.
    ///
    /// Returns `false` when the request was ignored.
    pub fn request_close(&self, draft: &mut ProofDraft) -> bool {
        if self.is_submitting() {
            tracing::debug!("[ProofSubmitter] Close ignored while submitting");
            return false;
        }
        draft.clear();
        true
    }

    fn fail(&self, quest_id: &str, err: QuestError) -> QuestError {
        tracing::warn!(
            "[ProofSubmitter] Submission for quest {} failed: {}",
            quest_id,
            err
        );
        *self.error_slot() = Some(err.clone());
        err
    }

    fn error_slot(&self) -> MutexGuard<'_, Option<QuestError>> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
