use crate::storage::{Storage, PROGRESS_KEY};
use crate::{now_millis, CoreError, DeckId, ProgressPatch, UserId, UserProgress};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type ProgressMap = BTreeMap<UserId, BTreeMap<DeckId, UserProgress>>;

/// Per-user study progress, kept apart from deck content under [`PROGRESS_KEY`].
/// Records are never deleted, not even when their deck is.
pub struct ProgressTracker {
    storage: Arc<dyn Storage>,
    writer: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            writer: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<ProgressMap, CoreError> {
        match self.storage.read(PROGRESS_KEY).await? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(ProgressMap::new()),
        }
    }

    pub async fn get(&self, user_id: &str, deck_id: &str) -> Result<Option<UserProgress>, CoreError> {
        let mut all = self.load().await?;
        Ok(all
            .get_mut(user_id)
            .and_then(|decks| decks.remove(deck_id)))
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<UserProgress>, CoreError> {
        let mut all = self.load().await?;
        Ok(all
            .remove(user_id)
            .map(|decks| decks.into_values().collect())
            .unwrap_or_default())
    }

    pub async fn update(&self, user_id: &str, deck_id: &str, patch: ProgressPatch) -> Result<(), CoreError> {
        self.update_with(user_id, deck_id, move |_| patch).await
    }

    /// Like [`update`](Self::update), but the patch is computed from the stored
    /// record inside the same write cycle.
    pub async fn update_with<F>(&self, user_id: &str, deck_id: &str, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(Option<&UserProgress>) -> ProgressPatch + Send,
    {
        let _guard = self.writer.lock().await;
        let mut all = self.load().await?;
        let now = now_millis();
        let decks = all.entry(user_id.to_string()).or_default();
        let patch = f(decks.get(deck_id));
        decks
            .entry(deck_id.to_string())
            .or_insert_with(|| UserProgress::new(deck_id, now))
            .apply(patch, now);

        let value = serde_json::to_value(&all)?;
        self.storage.write(PROGRESS_KEY, value).await.map_err(|e| {
            warn!(error = %e, user_id, deck_id, "failed to persist progress");
            e
        })?;
        debug!(user_id, deck_id, "progress updated");
        Ok(())
    }
}
