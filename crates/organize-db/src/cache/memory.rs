use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheBackend, glob_matches};
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`CacheBackend`].
///
/// Can be switched offline to exercise the paths that treat a failing cache
/// as non-fatal.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`CacheError::Unavailable`]
    /// while `available` is `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of unexpired entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_available(&self) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("memory cache switched off".to_string()))
        }
    }
}

impl CacheBackend for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<String>>> {
        Box::pin(async move {
            self.ensure_available()?;
            let now = Instant::now();
            Ok(self
                .entries
                .read()
                .await
                .get(key)
                .filter(|e| e.is_live(now))
                .map(|e| e.value.clone()))
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            self.ensure_available()?;
            let entry = CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            };
            self.entries.write().await.insert(key.to_string(), entry);
            Ok(())
        })
    }

    fn keys<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, CacheResult<Vec<String>>> {
        Box::pin(async move {
            self.ensure_available()?;
            let now = Instant::now();
            let mut keys: Vec<String> = self
                .entries
                .read()
                .await
                .iter()
                .filter(|(key, entry)| entry.is_live(now) && glob_matches(pattern, key))
                .map(|(key, _)| key.clone())
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn del<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            self.ensure_available()?;
            let mut entries = self.entries.write().await;
            for key in keys {
                entries.remove(key);
            }
            Ok(())
        })
    }
}
