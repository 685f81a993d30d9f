//! Key-value cache backends.
//!
//! ## Summary
//! [`CacheBackend`] exposes the four operations the cache coordinator needs:
//! `GET`, `SET` with an optional expiry, `KEYS` by glob pattern and `DEL`.
//! Patterns follow Redis glob syntax (`*`, `?`, `\` escapes).

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::CacheResult;

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

pub trait CacheBackend: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<String>>>;

    /// Stores `value`. `None` means the entry never expires.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, CacheResult<()>>;

    fn keys<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, CacheResult<Vec<String>>>;

    /// Deletes the given keys. Missing keys are ignored.
    fn del<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, CacheResult<()>>;
}

/// Escapes Redis glob metacharacters so `literal` only matches itself.
#[must_use]
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Matches `text` against a Redis-style glob supporting `*`, `?` and `\`
/// escapes. Character classes are not supported and match literally.
#[must_use]
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some('?') => {
                p += 1;
                t += 1;
                continue;
            }
            Some('\\') if pattern.get(p + 1) == Some(&text[t]) => {
                p += 2;
                t += 1;
                continue;
            }
            Some(c) if *c != '\\' && *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((star, matched)) => {
                p = star + 1;
                t = matched + 1;
                backtrack = Some((star, matched + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
