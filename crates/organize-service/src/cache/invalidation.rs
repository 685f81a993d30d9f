use futures::future::BoxFuture;

use organize_core::category::Category;
use organize_db::cache::CacheBackend;

use super::key;
use crate::error::ServiceResult;

/// Strategy for dropping every cached entry of one user.
pub trait Invalidation: Send + Sync {
    /// Removes the user's cached listings, counts and parent lookups and
    /// returns how many keys were targeted.
    fn invalidate_user<'a>(
        &'a self,
        backend: &'a dyn CacheBackend,
        user_id: &'a str,
    ) -> BoxFuture<'a, ServiceResult<usize>>;
}

/// Scans for listing and count keys by prefix pattern and deletes them
/// together with the fixed parent-lookup keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternInvalidation;

impl Invalidation for PatternInvalidation {
    fn invalidate_user<'a>(
        &'a self,
        backend: &'a dyn CacheBackend,
        user_id: &'a str,
    ) -> BoxFuture<'a, ServiceResult<usize>> {
        Box::pin(async move {
            let mut keys = Vec::new();
            for function in [key::LIST_FUNCTION, key::COUNT_FUNCTION] {
                let pattern = key::function_pattern(user_id, function)?;
                keys.extend(backend.keys(&pattern).await?);
            }
            for category in Category::ALL.into_iter().filter(|c| !c.is_root()) {
                keys.push(key::parents_key(user_id, category)?);
            }

            backend.del(&keys).await?;
            Ok(keys.len())
        })
    }
}
