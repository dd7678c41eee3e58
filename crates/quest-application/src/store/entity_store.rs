use quest_core::{Entity, QuestError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// What happened to the response of a `refresh_with` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The collection was replaced with this many records.
    Applied(usize),
    /// A later refresh was issued before this one settled; the response was dropped.
    Superseded,
}

struct StoreState<E> {
    records: HashMap<String, E>,
    /// Ids in the order the server listed them.
    order: Vec<String>,
    error: Option<QuestError>,
    is_loading: bool,
}

/// In-memory source of truth for one kind of entity, keyed by id.
///
/// Views read snapshots; mutation only happens through `refresh_with`,
/// `patch` and `update_with`. All mutation happens under one write guard,
/// so a reader never sees a half-applied refresh.
pub struct EntityStore<E: Entity> {
    state: RwLock<StoreState<E>>,
    /// Ticket of the most recently issued refresh.
    issued: AtomicU64,
    sequencing: bool,
}

impl<E: Entity> EntityStore<E> {
    /// Creates an empty store.
    ///
    /// With `sequencing` on, a refresh response is applied only if no later
    /// refresh was issued in the meantime. With it off the last response to
    /// arrive wins, even if it is older.
    pub fn new(sequencing: bool) -> Self {
        Self {
            state: RwLock::new(StoreState {
                records: HashMap::new(),
                order: Vec::new(),
                error: None,
                is_loading: false,
            }),
            issued: AtomicU64::new(0),
            sequencing,
        }
    }

    /// Replaces the whole collection with the result of `fetch`.
    ///
    /// On success the collection is swapped atomically and the error flag is
    /// cleared. On failure the error flag is set and the previous collection
    /// stays readable.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when it belongs to the latest refresh.
    pub async fn refresh_with<F>(&self, fetch: F) -> Result<RefreshOutcome>
    where
        F: Future<Output = Result<Vec<E>>>,
    {
        self.refresh_committing(async { fetch.await.map(|records| (records, ())) }, |()| {})
            .await
    }

    /// Like [`refresh_with`](Self::refresh_with), for fetches that return data
    /// alongside the records (e.g. a pagination flag).
    ///
    /// `commit` receives that data only when the records are applied, and runs
    /// under the same write guard, so a superseded response never reaches it.
    pub async fn refresh_committing<F, M, C>(&self, fetch: F, commit: C) -> Result<RefreshOutcome>
    where
        F: Future<Output = Result<(Vec<E>, M)>>,
        C: FnOnce(M),
    {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().await.is_loading = true;

        let result = fetch.await;

        let mut state = self.state.write().await;
        if self.sequencing && ticket != self.issued.load(Ordering::SeqCst) {
            tracing::debug!(
                "[EntityStore<{}>] Dropping refresh #{} (latest is #{})",
                E::ENTITY_TYPE,
                ticket,
                self.issued.load(Ordering::SeqCst)
            );
            return Ok(RefreshOutcome::Superseded);
        }
        state.is_loading = false;

        match result {
            Ok((records, extra)) => {
                let mut by_id = HashMap::with_capacity(records.len());
                let mut order = Vec::with_capacity(records.len());
                for record in records {
                    let id = record.id().to_string();
                    if by_id.insert(id.clone(), record).is_none() {
                        order.push(id);
                    }
                }
                let count = order.len();
                state.records = by_id;
                state.order = order;
                state.error = None;
                commit(extra);
                tracing::debug!(
                    "[EntityStore<{}>] Refresh #{} applied ({} records)",
                    E::ENTITY_TYPE,
                    ticket,
                    count
                );
                Ok(RefreshOutcome::Applied(count))
            }
            Err(err) => {
                tracing::warn!(
                    "[EntityStore<{}>] Refresh #{} failed, keeping {} stale records: {}",
                    E::ENTITY_TYPE,
                    ticket,
                    state.order.len(),
                    err
                );
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Merges `patch` into the record for `id`.
    ///
    /// Returns `true` if the record exists and changed. An empty patch and an
    /// unknown id are both no-ops; a patch never creates a record.
    pub async fn patch(&self, id: &str, patch: &E::Patch) -> bool {
        if E::patch_is_empty(patch) {
            return false;
        }
        let mut state = self.state.write().await;
        match state.records.get_mut(id) {
            Some(record) => record.apply_patch(patch),
            None => {
                tracing::debug!(
                    "[EntityStore<{}>] Patch for unknown id '{}' ignored",
                    E::ENTITY_TYPE,
                    id
                );
                false
            }
        }
    }

    /// Runs `f` on the record for `id` under the write guard.
    ///
    /// Reading the current value and writing the next one happen without any
    /// suspension point in between. Returns `None` if the id is unknown.
    pub async fn update_with<R, F>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut E) -> R,
    {
        let mut state = self.state.write().await;
        state.records.get_mut(id).map(f)
    }

    pub async fn get_by_id(&self, id: &str) -> Option<E> {
        self.state.read().await.records.get(id).cloned()
    }

    /// All records, in the order the server listed them.
    pub async fn list(&self) -> Vec<E> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The error of the last settled refresh, if it failed.
    pub async fn error(&self) -> Option<QuestError> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{proof, quest_entry};
    use quest_core::proof::{BeliefState, ProofDetails, ProofPatch};
    use quest_core::quest::{QuestEntry, QuestPatch, QuestStatus};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn entries(ids: &[&str]) -> Vec<QuestEntry> {
        ids.iter()
            .map(|id| quest_entry(id, QuestStatus::NotStarted))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let store = EntityStore::<QuestEntry>::new(true);

        store.refresh_with(async { Ok(entries(&["a", "b"])) }).await.unwrap();
        let outcome = store.refresh_with(async { Ok(entries(&["c"])) }).await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Applied(1));
        assert!(store.get_by_id("a").await.is_none());
        assert!(store.get_by_id("c").await.is_some());
        assert!(!store.is_loading().await);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let store = EntityStore::<QuestEntry>::new(true);

        store.refresh_with(async { Ok(entries(&["a", "b"])) }).await.unwrap();
        let first = store.list().await;
        store.refresh_with(async { Ok(entries(&["a", "b"])) }).await.unwrap();

        assert_eq!(store.list().await, first);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_data() {
        let store = EntityStore::<QuestEntry>::new(true);
        store.refresh_with(async { Ok(entries(&["a"])) }).await.unwrap();

        let err = store
            .refresh_with(async { Err(QuestError::transport("offline")) })
            .await
            .unwrap_err();

        assert_eq!(err, QuestError::transport("offline"));
        assert_eq!(store.error().await, Some(QuestError::transport("offline")));
        assert_eq!(store.len().await, 1);
        assert!(!store.is_loading().await);

        store.refresh_with(async { Ok(entries(&["a"])) }).await.unwrap();
        assert_eq!(store.error().await, None);
    }

    #[tokio::test]
    async fn test_list_keeps_server_order_and_dedupes() {
        let store = EntityStore::<QuestEntry>::new(true);
        store
            .refresh_with(async { Ok(entries(&["z", "a", "z", "m"])) })
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .into_iter()
            .map(|e| e.quest.ulid)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let store = EntityStore::<QuestEntry>::new(true);
        store.refresh_with(async { Ok(entries(&["a"])) }).await.unwrap();
        let before = store.get_by_id("a").await;

        assert!(!store.patch("a", &QuestPatch::default()).await);
        assert_eq!(store.get_by_id("a").await, before);
    }

    #[tokio::test]
    async fn test_patch_unknown_id_does_not_create() {
        let store = EntityStore::<ProofDetails>::new(true);
        store
            .refresh_with(async { Ok(vec![proof("p1", false, 3)]) })
            .await
            .unwrap();

        let applied = store
            .patch("ghost", &ProofPatch::belief(BeliefState::new(true, 1)))
            .await;

        assert!(!applied);
        assert!(store.get_by_id("ghost").await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_patch_merges_into_existing_record() {
        let store = EntityStore::<ProofDetails>::new(true);
        store
            .refresh_with(async { Ok(vec![proof("p1", false, 3)]) })
            .await
            .unwrap();

        assert!(
            store
                .patch("p1", &ProofPatch::belief(BeliefState::new(true, 4)))
                .await
        );
        let p1 = store.get_by_id("p1").await.unwrap();
        assert_eq!(p1.belief(), BeliefState::new(true, 4));
        assert_eq!(p1.quest_title, "Quest for p1");
    }

    /// Refresh A is issued before B, but B's response lands first.
    async fn race_two_refreshes(sequencing: bool) -> (Vec<String>, RefreshOutcome) {
        let store = Arc::new(EntityStore::<QuestEntry>::new(sequencing));
        let (tx_a, rx_a) = oneshot::channel::<Vec<QuestEntry>>();
        let (tx_b, rx_b) = oneshot::channel::<Vec<QuestEntry>>();

        let a = tokio::spawn({
            let store = store.clone();
            async move {
                store
                    .refresh_with(async move { Ok(rx_a.await.unwrap()) })
                    .await
                    .unwrap()
            }
        });
        tokio::task::yield_now().await;
        let b = tokio::spawn({
            let store = store.clone();
            async move {
                store
                    .refresh_with(async move { Ok(rx_b.await.unwrap()) })
                    .await
                    .unwrap()
            }
        });
        tokio::task::yield_now().await;

        tx_b.send(entries(&["fresh"])).unwrap();
        assert_eq!(b.await.unwrap(), RefreshOutcome::Applied(1));
        tx_a.send(entries(&["stale"])).unwrap();
        let outcome_a = a.await.unwrap();

        let ids = store
            .list()
            .await
            .into_iter()
            .map(|e| e.quest.ulid)
            .collect();
        (ids, outcome_a)
    }

    #[tokio::test]
    async fn test_out_of_order_refresh_with_sequencing_keeps_latest() {
        let (ids, outcome_a) = race_two_refreshes(true).await;

        assert_eq!(outcome_a, RefreshOutcome::Superseded);
        assert_eq!(ids, vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_out_of_order_refresh_without_sequencing_keeps_last_arrival() {
        let (ids, outcome_a) = race_two_refreshes(false).await;

        assert_eq!(outcome_a, RefreshOutcome::Applied(1));
        assert_eq!(ids, vec!["stale"]);
    }
}
