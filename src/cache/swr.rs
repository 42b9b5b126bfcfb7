//! Stale-while-revalidate listing cache.
//!
//! Cold keys fetch synchronously. Fresh hits return the cached payload.
//! Stale hits return the cached payload immediately and launch at most
//! one background refresh per key; a failed refresh keeps the stale
//! payload in place and is only logged. Populated keys are never evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::drive::{DriveError, ListMode, Lister, Node};

/// Cache key: folder id plus listing mode.
pub type CacheKey = (String, ListMode);

struct CacheEntry {
    payload: Arc<Vec<Node>>,
    fetched_at: Instant,
    refreshing: bool,
}

/// Keyed listing cache with stale-while-revalidate semantics.
///
/// The `refreshing` flag and the payload swap are both guarded by the
/// same lock, which upholds "at most one in-flight refresh per key".
pub struct SwrCache {
    source: Arc<dyn Lister>,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl SwrCache {
    /// Create a cache over `source` with the given freshness window.
    pub fn new(source: Arc<dyn Lister>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the listing for `folder_id`, per the SWR policy.
    ///
    /// Only a cold miss can fail; stale reads never surface refresh
    /// errors and never block on the refresh.
    pub async fn get(
        &self,
        folder_id: &str,
        mode: ListMode,
    ) -> Result<Arc<Vec<Node>>, DriveError> {
        let key = (folder_id.to_string(), mode);

        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get_mut(&key) {
                let payload = Arc::clone(&entry.payload);
                if entry.fetched_at.elapsed() <= self.ttl {
                    return Ok(payload);
                }
                // Stale: claim the refresh slot under the same lock so
                // concurrent readers cannot launch a second refresh.
                if !entry.refreshing {
                    entry.refreshing = true;
                    self.spawn_refresh(key);
                }
                return Ok(payload);
            }
        }

        // Cold miss: fetch synchronously, errors propagate to the caller.
        let payload = Arc::new(self.source.list(folder_id, mode).await?);
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                payload: Arc::clone(&payload),
                fetched_at: Instant::now(),
                refreshing: false,
            },
        );
        Ok(payload)
    }

    /// Number of populated keys, for logging.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn spawn_refresh(&self, key: CacheKey) {
        let source = Arc::clone(&self.source);
        let entries = Arc::clone(&self.entries);

        tokio::spawn(async move {
            let result = source.list(&key.0, key.1).await;
            let mut entries = entries.write().await;
            let Some(entry) = entries.get_mut(&key) else {
                return;
            };
            match result {
                Ok(payload) => {
                    entry.payload = Arc::new(payload);
                    entry.fetched_at = Instant::now();
                    entry.refreshing = false;
                }
                Err(e) => {
                    // Fire-and-forget staleness repair: keep serving the
                    // stale payload until a later refresh succeeds.
                    tracing::warn!(folder = %key.0, "background refresh failed: {e}");
                    entry.refreshing = false;
                }
            }
        });
    }
}

#[async_trait]
impl Lister for SwrCache {
    async fn list(&self, folder_id: &str, mode: ListMode) -> Result<Vec<Node>, DriveError> {
        Ok(self.get(folder_id, mode).await?.as_ref().clone())
    }
}
