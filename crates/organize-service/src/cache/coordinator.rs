use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use organize_db::cache::CacheBackend;

use super::invalidation::{Invalidation, PatternInvalidation};
use crate::error::ServiceResult;

/// Serves cached results and drops stale ones after mutations.
///
/// The store stays the source of truth: cache failures are logged and never
/// fail a request.
pub struct CacheCoordinator {
    backend: Arc<dyn CacheBackend>,
    invalidation: Arc<dyn Invalidation>,
    parents_ttl: Duration,
}

impl CacheCoordinator {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, parents_ttl: Duration) -> Self {
        Self {
            backend,
            invalidation: Arc::new(PatternInvalidation),
            parents_ttl,
        }
    }

    #[must_use]
    pub fn with_invalidation(mut self, invalidation: Arc<dyn Invalidation>) -> Self {
        self.invalidation = invalidation;
        self
    }

    #[must_use]
    pub const fn parents_ttl(&self) -> Duration {
        self.parents_ttl
    }

    /// ## Summary
    /// Returns the cached value for `key`, or computes, stores and returns it.
    ///
    /// A corrupt payload counts as a miss. Read and write failures are
    /// logged and the computed value is returned anyway.
    ///
    /// ## Errors
    /// Only errors from `compute` are returned.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> ServiceResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        match self.backend.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    tracing::debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(error) => tracing::warn!(key, %error, "Discarding corrupt cache entry"),
            },
            Ok(None) => tracing::debug!(key, "Cache miss"),
            Err(error) => tracing::warn!(key, %error, "Cache read failed"),
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(payload) => {
                if let Err(error) = self.backend.set(key, &payload, ttl).await {
                    tracing::warn!(key, %error, "Cache write failed");
                }
            }
            Err(error) => tracing::warn!(key, %error, "Cache payload serialization failed"),
        }

        Ok(value)
    }

    /// ## Summary
    /// Drops every cached listing, count and parent lookup of `user_id`.
    /// Failures are logged and swallowed.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_for_user(&self, user_id: &str) {
        match self
            .invalidation
            .invalidate_user(self.backend.as_ref(), user_id)
            .await
        {
            Ok(keys) => tracing::debug!(keys, "Cache invalidated"),
            Err(error) => tracing::warn!(%error, "Cache invalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use organize_db::cache::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator(cache: Arc<MemoryCache>) -> CacheCoordinator {
        CacheCoordinator::new(cache, Duration::from_secs(300))
    }

    #[test_log::test(tokio::test)]
    async fn test_hit_skips_compute() {
        let cache = Arc::new(MemoryCache::new());
        let coordinator = coordinator(cache.clone());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = coordinator
                .read_through("k", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42_i64)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_corrupt_payload_is_a_miss() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("k", "not json", None).await.unwrap();
        let coordinator = coordinator(cache.clone());

        let value = coordinator
            .read_through("k", None, || async { Ok(7_i64) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("7"));
    }

    #[test_log::test(tokio::test)]
    async fn test_unavailable_cache_falls_through() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_available(false);
        let coordinator = coordinator(cache.clone());

        let value = coordinator
            .read_through("k", None, || async { Ok(vec!["a".to_string()]) })
            .await
            .unwrap();
        assert_eq!(value, vec!["a"]);

        coordinator.invalidate_for_user("u1").await;
    }

    struct CountingInvalidation(AtomicUsize);

    impl Invalidation for CountingInvalidation {
        fn invalidate_user<'a>(
            &'a self,
            _backend: &'a dyn CacheBackend,
            _user_id: &'a str,
        ) -> futures::future::BoxFuture<'a, ServiceResult<usize>> {
            Box::pin(async move { Ok(self.0.fetch_add(1, Ordering::SeqCst)) })
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_invalidation_strategy_is_replaceable() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("k", "1", None).await.unwrap();
        let counting = Arc::new(CountingInvalidation(AtomicUsize::new(0)));
        let coordinator = coordinator(cache.clone()).with_invalidation(counting.clone());

        coordinator.invalidate_for_user("u1").await;
        coordinator.invalidate_for_user("u1").await;

        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_compute_errors_are_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let coordinator = coordinator(cache.clone());

        let result: ServiceResult<i64> = coordinator
            .read_through("k", None, || async {
                Err(ServiceError::BackendUnavailable("down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(ServiceError::BackendUnavailable(_))));
        assert!(cache.is_empty().await);
    }
}
