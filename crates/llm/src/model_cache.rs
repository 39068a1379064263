//! Loaded model cache
//!
//! Memoizes model acquisition per model id. Concurrent first uses of the
//! same id share a single load; failed loads are not cached.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use studychat_common::Result;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

/// When cached models are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Keep every model for the lifetime of the process
    Never,
    /// Keep at most this many models, evicting the least recently used
    MaxEntries(usize),
}

impl EvictionPolicy {
    /// Map a configured capacity to a policy (0 = never evict)
    pub fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            Self::Never
        } else {
            Self::MaxEntries(capacity)
        }
    }
}

type Slot<T> = Arc<OnceCell<Arc<T>>>;

struct Entries<T> {
    slots: HashMap<String, Slot<T>>,
    /// Least recently used first
    order: VecDeque<String>,
}

impl<T> Entries<T> {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
    }

    fn remove(&mut self, key: &str) -> bool {
        self.order.retain(|k| k != key);
        self.slots.remove(key).is_some()
    }
}

/// Model instance cache keyed by model id
pub struct ModelCache<T> {
    policy: EvictionPolicy,
    entries: Mutex<Entries<T>>,
}

impl<T: Send + Sync> ModelCache<T> {
    /// Create new cache with an eviction policy
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(Entries {
                slots: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Return the cached model, loading it on first use
    pub async fn get_or_load<F, Fut>(&self, model_id: &str, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = {
            let mut entries = self.entries.lock().await;
            let slot = entries
                .slots
                .entry(model_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            entries.touch(model_id);
            slot
        };

        if let Some(model) = slot.get() {
            debug!("Model cache hit: {}", model_id);
            return Ok(model.clone());
        }

        let result = slot
            .get_or_try_init(move || async move {
                info!("Loading model: {}", model_id);
                load().await.map(Arc::new)
            })
            .await
            .cloned();

        match result {
            Ok(model) => {
                self.enforce_policy(model_id).await;
                Ok(model)
            }
            Err(e) => {
                let mut entries = self.entries.lock().await;
                let still_empty = entries
                    .slots
                    .get(model_id)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized());
                if still_empty {
                    entries.remove(model_id);
                }
                Err(e)
            }
        }
    }

    async fn enforce_policy(&self, keep: &str) {
        let EvictionPolicy::MaxEntries(capacity) = self.policy else {
            return;
        };

        let mut entries = self.entries.lock().await;
        while entries.slots.len() > capacity {
            let Some(victim) = entries.order.iter().find(|k| k.as_str() != keep).cloned() else {
                break;
            };
            info!("Evicting model from cache: {}", victim);
            entries.remove(&victim);
        }
    }

    /// Whether a loaded model is cached for this id
    pub async fn contains(&self, model_id: &str) -> bool {
        self.entries
            .lock()
            .await
            .slots
            .get(model_id)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of loaded models
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .slots
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop one model; returns whether it was present
    pub async fn evict(&self, model_id: &str) -> bool {
        self.entries.lock().await.remove(model_id)
    }

    /// Drop every model
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.slots.clear();
        entries.order.clear();
    }
}
