use crate::state::Stage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Entry = Arc<Mutex<Option<Stage>>>;

/// In-memory conversation state keyed by participant id.
///
/// `None` for a participant means "fresh participant"; handlers initialise a
/// default stage rather than failing. Updates for the same id are serialized
/// through a per-id lock, so at most one transition is in flight per
/// participant while distinct participants proceed concurrently.
pub struct SessionStore {
    inner: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn entry(&self, id: &str) -> Entry {
        let mut map = self.inner.lock().await;
        map.entry(id.to_string()).or_default().clone()
    }

    /// Acquires the per-participant lock for the duration of one event.
    ///
    /// The guard holds the participant's current stage (or `None`); a second
    /// concurrent event for the same id queues here until the first
    /// transition completes.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<Option<Stage>> {
        self.entry(id).await.lock_owned().await
    }

    /// Returns a clone of the participant's current stage.
    pub async fn get(&self, id: &str) -> Option<Stage> {
        self.entry(id).await.lock().await.clone()
    }

    /// Replaces the participant's stage wholesale.
    pub async fn set(&self, id: &str, stage: Stage) {
        *self.entry(id).await.lock().await = Some(stage);
    }

    /// Clears the participant's stage (back to "fresh participant").
    pub async fn clear(&self, id: &str) {
        *self.entry(id).await.lock().await = None;
    }

    /// Applies a transition function atomically with respect to other
    /// updates for the same id.
    pub async fn update<F>(&self, id: &str, mutator: F)
    where
        F: FnOnce(Option<Stage>) -> Option<Stage>,
    {
        let entry = self.entry(id).await;
        let mut guard = entry.lock().await;
        let current = guard.take();
        *guard = mutator(current);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
