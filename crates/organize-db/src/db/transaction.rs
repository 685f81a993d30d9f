//! Transaction helper for multi-statement store operations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |tx| async move {
//!     entity::lock_live(tx, category, user_id, id).await?;
//!     entity::mark_deleted(tx, category, user_id, id).await?;
//!     Ok::<_, StoreError>(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};

/// ## Summary
/// Runs `callback` inside a transaction, committing on `Ok` and rolling back
/// on `Err`.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, T, E, F>(
    conn: &mut AsyncPgConnection,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
        + Send
        + 'a,
    T: Send + 'a,
    E: From<diesel::result::Error> + Send + 'a,
{
    conn.transaction::<T, E, F>(callback).await
}
