use crate::domain::entities::CachedValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Rewrites a cache entry; receives the current value, returns the new one.
pub type CacheUpdater = Box<dyn FnOnce(Option<CachedValue>) -> Option<CachedValue> + Send>;

/// Keyed store of server-derived state shared by readers and mutations.
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Current value under `key`, fresh or not.
    async fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    async fn set(&self, key: CacheKey, value: CachedValue);

    /// Atomically applies `updater` and returns the value it replaced.
    ///
    /// The returned value is the snapshot a pending mutation restores on
    /// failure.
    async fn update(&self, key: CacheKey, updater: CacheUpdater) -> Option<CachedValue>;

    /// Puts a snapshot back; `None` clears the entry.
    async fn restore(&self, key: CacheKey, snapshot: Option<CachedValue>);

    /// Cancels any in-flight refresh of `key`; a refresh resolving later is
    /// discarded.
    async fn cancel_pending(&self, key: &CacheKey);

    /// Marks `key` stale and starts a background refresh from the server.
    async fn invalidate(&self, key: &CacheKey);

    /// Returns a fresh value, loading it from the server when missing or stale.
    async fn fetch(&self, key: &CacheKey) -> Result<CachedValue, AppError>;

    /// Waits for the in-flight refresh of `key`, if any, to finish.
    async fn settle(&self, key: &CacheKey);
}
