use super::{EntityStore, RefreshOutcome};
use crate::call::remote_call;
use quest_core::quest::QuestEntry;
use quest_core::{RemoteClient, Result};
use std::sync::Arc;
use std::time::Duration;

/// Today's quest entries for the current user.
pub struct QuestStore {
    entries: EntityStore<QuestEntry>,
    remote: Arc<dyn RemoteClient>,
    timeout: Duration,
}

impl QuestStore {
    pub fn new(remote: Arc<dyn RemoteClient>, timeout: Duration, sequencing: bool) -> Self {
        Self {
            entries: EntityStore::new(sequencing),
            remote,
            timeout,
        }
    }

    /// Re-fetches the daily quests and replaces the collection.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.entries
            .refresh_with(remote_call(
                "list_daily_quests",
                self.timeout,
                self.remote.list_daily_quests(),
            ))
            .await
    }

    pub async fn get_task_by_id(&self, quest_id: &str) -> Option<QuestEntry> {
        self.entries.get_by_id(quest_id).await
    }

    pub async fn tasks(&self) -> Vec<QuestEntry> {
        self.entries.list().await
    }

    pub fn entries(&self) -> &EntityStore<QuestEntry> {
        &self.entries
    }
}
