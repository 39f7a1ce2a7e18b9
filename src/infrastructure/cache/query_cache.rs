use crate::application::ports::cache::{CacheUpdater, QueryCache};
use crate::application::ports::query_loader::QueryLoader;
use crate::domain::entities::CachedValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct InFlight {
    id: u64,
    cancel: CancellationToken,
    finished: CancellationToken,
}

#[derive(Default)]
struct Slot {
    value: Option<CachedValue>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Bumped on every write; a refresh only lands if it still matches.
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Slot {
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.stale
            && self.value.is_some()
            && self
                .fetched_at
                .is_some_and(|fetched| fetched.elapsed() < stale_time)
    }
}

/// In-memory query cache with cooperative refresh cancellation.
#[derive(Clone)]
pub struct MemoryQueryCache {
    slots: Arc<RwLock<HashMap<CacheKey, Slot>>>,
    loader: Arc<dyn QueryLoader>,
    stale_time: Duration,
    refresh_ids: Arc<AtomicU64>,
}

impl MemoryQueryCache {
    pub fn new(loader: Arc<dyn QueryLoader>, stale_time_seconds: u64) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            loader,
            stale_time: Duration::from_secs(stale_time_seconds),
            refresh_ids: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Whether `key` is waiting for a refresh.
    #[cfg(test)]
    pub(crate) async fn is_stale(&self, key: &CacheKey) -> bool {
        let slots = self.slots.read().await;
        slots.get(key).is_some_and(|slot| slot.stale)
    }

    #[cfg(test)]
    pub(crate) async fn is_refreshing(&self, key: &CacheKey) -> bool {
        let slots = self.slots.read().await;
        slots.get(key).is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Waits until every refresh running right now has finished.
    pub async fn settle_all(&self) {
        let pending: Vec<CancellationToken> = {
            let slots = self.slots.read().await;
            slots
                .values()
                .filter_map(|slot| slot.in_flight.as_ref())
                .map(|in_flight| in_flight.finished.clone())
                .collect()
        };
        join_all(pending.iter().map(|finished| finished.cancelled())).await;
    }

    async fn start_refresh(&self, key: &CacheKey) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.clone()).or_default();

        if let Some(previous) = slot.in_flight.take() {
            previous.cancel.cancel();
        }

        let id = self.refresh_ids.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        let generation = slot.generation;
        slot.in_flight = Some(InFlight {
            id,
            cancel: cancel.clone(),
            finished: finished.clone(),
        });

        debug!(key = %key, refresh = id, generation, "starting background refresh");

        let cache = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let _finished = finished.drop_guard();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(key = %key, refresh = id, "refresh cancelled before completion");
                    return;
                }
                result = cache.loader.load(&key) => result,
            };
            cache.complete_refresh(&key, id, generation, &cancel, result).await;
        });
    }

    async fn complete_refresh(
        &self,
        key: &CacheKey,
        id: u64,
        generation: u64,
        cancel: &CancellationToken,
        result: Result<CachedValue, AppError>,
    ) {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(key) else {
            return;
        };

        if slot.in_flight.as_ref().is_some_and(|f| f.id == id) {
            slot.in_flight = None;
        }

        if cancel.is_cancelled() || slot.generation != generation {
            debug!(
                key = %key,
                refresh = id,
                started_at = generation,
                current = slot.generation,
                "discarding refresh that lost to a newer write"
            );
            return;
        }

        match result {
            Ok(value) => {
                slot.value = Some(value);
                slot.fetched_at = Some(Instant::now());
                slot.stale = false;
                slot.bump();
                debug!(key = %key, refresh = id, "refresh applied");
            }
            Err(e) => {
                warn!(key = %key, refresh = id, error = %e, "background refresh failed");
            }
        }
    }
}

#[async_trait]
impl QueryCache for MemoryQueryCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let slots = self.slots.read().await;
        slots.get(key).and_then(|slot| slot.value.clone())
    }

    async fn set(&self, key: CacheKey, value: CachedValue) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        slot.value = Some(value);
        slot.fetched_at = Some(Instant::now());
        slot.stale = false;
        slot.bump();
    }

    async fn update(&self, key: CacheKey, updater: CacheUpdater) -> Option<CachedValue> {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        let previous = slot.value.clone();
        slot.value = updater(previous.clone());
        slot.bump();
        previous
    }

    async fn restore(&self, key: CacheKey, snapshot: Option<CachedValue>) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        slot.value = snapshot;
        slot.bump();
    }

    async fn cancel_pending(&self, key: &CacheKey) {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(key) {
            if let Some(in_flight) = slot.in_flight.take() {
                debug!(key = %key, refresh = in_flight.id, "cancelling in-flight refresh");
                in_flight.cancel.cancel();
            }
            slot.bump();
        }
    }

    async fn invalidate(&self, key: &CacheKey) {
        {
            let mut slots = self.slots.write().await;
            slots.entry(key.clone()).or_default().stale = true;
        }
        self.start_refresh(key).await;
    }

    async fn fetch(&self, key: &CacheKey) -> Result<CachedValue, AppError> {
        let generation = {
            let slots = self.slots.read().await;
            match slots.get(key) {
                Some(slot) if slot.is_fresh(self.stale_time) => {
                    if let Some(value) = &slot.value {
                        return Ok(value.clone());
                    }
                    slot.generation
                }
                Some(slot) => slot.generation,
                None => 0,
            }
        };

        let loaded = self.loader.load(key).await?;

        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.clone()).or_default();
        if slot.generation == generation {
            slot.value = Some(loaded.clone());
            slot.fetched_at = Some(Instant::now());
            slot.stale = false;
            slot.bump();
            Ok(loaded)
        } else {
            // A write landed while loading; it is the newer view.
            Ok(slot.value.clone().unwrap_or(loaded))
        }
    }

    async fn settle(&self, key: &CacheKey) {
        let finished = {
            let slots = self.slots.read().await;
            slots
                .get(key)
                .and_then(|slot| slot.in_flight.as_ref())
                .map(|in_flight| in_flight.finished.clone())
        };
        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }
}
