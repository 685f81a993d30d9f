use diesel_async::scoped_futures::ScopedFutureExt;
use futures::future::BoxFuture;

use organize_core::category::Category;
use organize_core::model::{
    Entity, EntityFields, EntityId, EntitySearch, EntitySummary, ListQuery, ParentCandidate,
    ParentRef,
};

use super::EntityStore;
use crate::db::DbProvider;
use crate::db::connection::DbPool;
use crate::db::query::aggregate;
use crate::db::query::entity::{self, RowLock};
use crate::db::transaction::with_transaction;
use crate::error::{StoreError, StoreResult};

/// PostgreSQL-backed [`EntityStore`].
#[derive(Clone)]
pub struct PgEntityStore {
    pool: DbPool,
}

impl PgEntityStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EntityStore for PgEntityStore {
    #[tracing::instrument(skip(self, fields), fields(name = %fields.name))]
    fn create<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<EntityId>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let id = with_transaction(&mut conn, |tx| {
                async move {
                    if let Some(parent) = entity::parent_of(category, fields) {
                        let live = entity::lock_live(
                            tx,
                            parent.category,
                            user_id,
                            parent.id,
                            RowLock::KeyShare,
                        )
                        .await?;
                        if !live {
                            return Err(StoreError::ParentNotFound {
                                category: parent.category,
                                id: parent.id,
                            });
                        }
                    }
                    Ok(entity::insert(tx, category, user_id, fields).await?)
                }
                .scope_boxed()
            })
            .await?;

            tracing::debug!(id, "Entity row inserted");
            Ok(id)
        })
    }

    #[tracing::instrument(skip(self))]
    fn get_one<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
    ) -> BoxFuture<'a, StoreResult<Entity>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            entity::find_live(&mut conn, category, user_id, id)
                .await?
                .map(|row| row.into_entity(category))
                .ok_or(StoreError::NotFound { category, id })
        })
    }

    #[tracing::instrument(skip(self, fields), fields(name = %fields.name))]
    fn update<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        fields: &'a EntityFields,
    ) -> BoxFuture<'a, StoreResult<Entity>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let row = with_transaction(&mut conn, |tx| {
                async move {
                    if let Some(parent) = entity::parent_of(category, fields) {
                        let live = entity::lock_live(
                            tx,
                            parent.category,
                            user_id,
                            parent.id,
                            RowLock::KeyShare,
                        )
                        .await?;
                        if !live {
                            return Err(StoreError::ParentNotFound {
                                category: parent.category,
                                id: parent.id,
                            });
                        }
                    }
                    entity::update(tx, category, user_id, id, fields)
                        .await?
                        .ok_or(StoreError::NotFound { category, id })
                }
                .scope_boxed()
            })
            .await?;

            Ok(row.into_entity(category))
        })
    }

    #[tracing::instrument(skip(self))]
    fn soft_delete<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        id: EntityId,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            with_transaction(&mut conn, |tx| {
                async move {
                    if !entity::lock_live(tx, category, user_id, id, RowLock::Update).await? {
                        return Err(StoreError::NotFound { category, id });
                    }

                    let count = aggregate::count_children(
                        tx,
                        user_id,
                        ParentRef::new(id, category),
                        child_categories,
                    )
                    .await?;
                    if count > 0 {
                        return Err(StoreError::HasChildren {
                            category,
                            id,
                            count,
                        });
                    }

                    entity::mark_deleted(tx, category, user_id, id).await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await
        })
    }

    #[tracing::instrument(skip(self))]
    fn count_children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<i64>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(aggregate::count_children(&mut conn, user_id, parent, child_categories).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn list_entities<'a>(
        &'a self,
        user_id: &'a str,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let rows = aggregate::list_summaries(&mut conn, user_id, query).await?;
            Ok(rows.into_iter().map(EntitySummary::from).collect())
        })
    }

    #[tracing::instrument(skip(self))]
    fn count_entities<'a>(
        &'a self,
        user_id: &'a str,
        search: &'a EntitySearch,
    ) -> BoxFuture<'a, StoreResult<i64>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(aggregate::count_matching(&mut conn, user_id, search).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn parent_candidates<'a>(
        &'a self,
        user_id: &'a str,
        categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<ParentCandidate>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let rows = aggregate::list_labels(&mut conn, user_id, categories).await?;
            Ok(rows.into_iter().map(ParentCandidate::from).collect())
        })
    }

    #[tracing::instrument(skip(self))]
    fn children<'a>(
        &'a self,
        user_id: &'a str,
        parent: ParentRef,
        child_categories: &'a [Category],
    ) -> BoxFuture<'a, StoreResult<Vec<EntitySummary>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let rows = aggregate::list_children(&mut conn, user_id, parent, child_categories).await?;
            Ok(rows.into_iter().map(EntitySummary::from).collect())
        })
    }
}
