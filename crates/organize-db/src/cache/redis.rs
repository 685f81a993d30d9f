use std::time::Duration;

use futures::future::BoxFuture;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::CacheBackend;
use crate::error::CacheResult;

/// Redis-backed [`CacheBackend`] over one multiplexed connection.
///
/// The connection is cloned per call; clones share the underlying socket.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// ## Summary
    /// Connects to Redis. Every command is bounded by `response_timeout`.
    ///
    /// ## Errors
    /// Returns an error if the URL is invalid or the server is unreachable.
    #[tracing::instrument(skip(url))]
    pub async fn connect(url: &str, response_timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client
            .get_multiplexed_async_connection_with_timeouts(response_timeout, response_timeout)
            .await?;
        tracing::info!("Cache connection established");
        Ok(Self { conn })
    }
}

impl CacheBackend for RedisCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<String>>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            Ok(conn.get::<_, Option<String>>(key).await?)
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            match ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
                None => conn.set::<_, _, ()>(key, value).await?,
            }
            Ok(())
        })
    }

    fn keys<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, CacheResult<Vec<String>>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            Ok(conn.keys::<_, Vec<String>>(pattern).await?)
        })
    }

    fn del<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            if keys.is_empty() {
                return Ok(());
            }
            let mut conn = self.conn.clone();
            conn.del::<_, ()>(keys.to_vec()).await?;
            Ok(())
        })
    }
}
