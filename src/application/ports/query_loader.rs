use crate::domain::entities::CachedValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Read side of the backend: loads the authoritative value for a cache key.
#[async_trait]
pub trait QueryLoader: Send + Sync {
    async fn load(&self, key: &CacheKey) -> Result<CachedValue, AppError>;
}
